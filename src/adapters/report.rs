use crate::config::DEFAULT_REPORT_HEADER;
use crate::domain::ports::ReportRenderer;

// A4 in points; margins follow the usual 10 mm sides / 20 mm bottom.
const PAGE_WIDTH: f64 = 595.28;
const PAGE_HEIGHT: f64 = 841.89;
const MARGIN: f64 = 28.35;
const BOTTOM_MARGIN: f64 = 56.69;
const CELL_HEIGHT: f64 = 28.35;
const BODY_LINE_HEIGHT: f64 = 17.01;

const HEADER_SIZE: f64 = 12.0;
const TITLE_SIZE: f64 = 11.0;
const BODY_SIZE: f64 = 10.0;

/// Courier glyphs are all 600/1000 em wide, so wrapping is exact.
const CHAR_WIDTH_EM: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone)]
struct TextLine {
    font: Font,
    size: f64,
    x: f64,
    /// Baseline measured from the top of the page.
    y: f64,
    text: Vec<u8>,
}

#[derive(Debug, Default)]
struct Page {
    lines: Vec<TextLine>,
}

/// Renders plain text into a paginated PDF using the built-in Courier fonts.
#[derive(Debug, Clone)]
pub struct PdfReport {
    header: String,
}

impl PdfReport {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }

    fn chars_per_line(size: f64) -> usize {
        (((PAGE_WIDTH - 2.0 * MARGIN) / (CHAR_WIDTH_EM * size)).floor() as usize).max(1)
    }

    fn start_page(&self, pages: &mut Vec<Page>) -> f64 {
        let header = to_latin1_lossy(&self.header);
        let width = header.len() as f64 * CHAR_WIDTH_EM * HEADER_SIZE;
        let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN);

        pages.push(Page {
            lines: vec![TextLine {
                font: Font::Bold,
                size: HEADER_SIZE,
                x,
                y: MARGIN + CELL_HEIGHT / 2.0 + HEADER_SIZE * 0.3,
                text: header,
            }],
        });

        MARGIN + CELL_HEIGHT
    }

    fn layout_pages(&self, title: &str, body: &str) -> Vec<Page> {
        let mut pages = Vec::new();
        let mut y = self.start_page(&mut pages);

        for line in wrap(&to_latin1_lossy(title), Self::chars_per_line(TITLE_SIZE)) {
            if y + CELL_HEIGHT > PAGE_HEIGHT - BOTTOM_MARGIN {
                y = self.start_page(&mut pages);
            }
            if let Some(page) = pages.last_mut() {
                page.lines.push(TextLine {
                    font: Font::Bold,
                    size: TITLE_SIZE,
                    x: MARGIN,
                    y: y + CELL_HEIGHT / 2.0 + TITLE_SIZE * 0.3,
                    text: line,
                });
            }
            y += CELL_HEIGHT;
        }

        for line in wrap(&to_latin1_lossy(body), Self::chars_per_line(BODY_SIZE)) {
            if y + BODY_LINE_HEIGHT > PAGE_HEIGHT - BOTTOM_MARGIN {
                y = self.start_page(&mut pages);
            }
            if let Some(page) = pages.last_mut() {
                page.lines.push(TextLine {
                    font: Font::Regular,
                    size: BODY_SIZE,
                    x: MARGIN,
                    y: y + BODY_LINE_HEIGHT / 2.0 + BODY_SIZE * 0.3,
                    text: line,
                });
            }
            y += BODY_LINE_HEIGHT;
        }

        pages
    }
}

impl Default for PdfReport {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_HEADER)
    }
}

impl ReportRenderer for PdfReport {
    fn render(&self, title: &str, body: &str) -> Vec<u8> {
        let pages = self.layout_pages(title, body);
        tracing::debug!("Rendering report '{}' on {} page(s)", title, pages.len());
        write_document(title, &pages)
    }
}

/// Encodes text as Latin-1, substituting `?` for anything the PDF core
/// fonts cannot show: code points above U+00FF and control characters.
/// Newlines survive so paragraphs can be split later.
pub fn to_latin1_lossy(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| *c != '\r')
        .map(|c| match c {
            '\n' => b'\n',
            '\t' => b' ',
            c if (c as u32) < 0x20 => b'?',
            c if (0x7F..=0x9F).contains(&(c as u32)) => b'?',
            c if (c as u32) <= 0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Greedy word wrap on Latin-1 bytes. Blank input lines are kept, words
/// longer than a line are split.
fn wrap(text: &[u8], width: usize) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();

    for paragraph in text.split(|b| *b == b'\n') {
        let mut current: Vec<u8> = Vec::new();

        for word in paragraph.split(|b| *b == b' ').filter(|w| !w.is_empty()) {
            let needed = if current.is_empty() {
                word.len()
            } else {
                current.len() + 1 + word.len()
            };

            if needed <= width {
                if !current.is_empty() {
                    current.push(b' ');
                }
                current.extend_from_slice(word);
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            let mut chunks = word.chunks(width).peekable();
            while let Some(chunk) = chunks.next() {
                if chunks.peek().is_some() {
                    lines.push(chunk.to_vec());
                } else {
                    current = chunk.to_vec();
                }
            }
        }

        lines.push(current);
    }

    lines
}

fn escape_pdf_string(text: &[u8]) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    for &byte in text {
        match byte {
            b'(' | b')' | b'\\' => {
                escaped.push('\\');
                escaped.push(byte as char);
            }
            0x20..=0x7E => escaped.push(byte as char),
            _ => escaped.push_str(&format!("\\{:03o}", byte)),
        }
    }
    escaped
}

struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut writer = Self {
            buf: Vec::new(),
            offsets: Vec::new(),
        };
        writer.push("%PDF-1.4\n");
        // Binary marker so transfer tools treat the file as binary.
        writer.buf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        writer
    }

    fn push(&mut self, text: &str) {
        self.buf.extend_from_slice(text.as_bytes());
    }

    fn object(&mut self, body: &str) {
        self.offsets.push(self.buf.len());
        let number = self.offsets.len();
        self.push(&format!("{} 0 obj\n{}\nendobj\n", number, body));
    }

    fn stream(&mut self, content: &str) {
        self.object(&format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    fn finish(mut self, root: usize, info: usize) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let count = self.offsets.len() + 1;

        self.push(&format!("xref\n0 {}\n0000000000 65535 f \n", count));
        let entries: String = self
            .offsets
            .iter()
            .map(|offset| format!("{:010} 00000 n \n", offset))
            .collect();
        self.push(&entries);
        self.push(&format!(
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            count, root, info, xref_offset
        ));

        self.buf
    }
}

fn page_content(page: &Page) -> String {
    page.lines
        .iter()
        .map(|line| {
            format!(
                "BT /{} {:.0} Tf {:.2} {:.2} Td ({}) Tj ET\n",
                line.font.resource(),
                line.size,
                line.x,
                PAGE_HEIGHT - line.y,
                escape_pdf_string(&line.text)
            )
        })
        .collect()
}

// Object layout: 1 catalog, 2 page tree, 3-4 fonts, 5 info, then a
// (page, content) pair per page starting at 6.
fn write_document(title: &str, pages: &[Page]) -> Vec<u8> {
    let mut pdf = PdfWriter::new();

    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", 6 + 2 * i))
        .collect();

    pdf.object("<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(&format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages.len()
    ));
    pdf.object("<< /Type /Font /Subtype /Type1 /BaseFont /Courier /Encoding /WinAnsiEncoding >>");
    pdf.object(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Courier-Bold /Encoding /WinAnsiEncoding >>",
    );
    pdf.object(&format!(
        "<< /Title ({}) /Producer (customs-desk) >>",
        escape_pdf_string(&to_latin1_lossy(title))
    ));

    for (i, page) in pages.iter().enumerate() {
        pdf.object(&format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH,
            PAGE_HEIGHT,
            7 + 2 * i
        ));
        pdf.stream(&page_content(page));
    }

    pdf.finish(1, 5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_render_produces_pdf_framing() {
        let pdf = PdfReport::default().render("VIABILITY", "Importing is viable.");

        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert!(contains(&pdf, b"(CUSTOMS REPORT) Tj"));
        assert!(contains(&pdf, b"(VIABILITY) Tj"));
        assert!(contains(&pdf, b"(Importing is viable.) Tj"));
    }

    #[test]
    fn test_startxref_points_at_xref_table() {
        let pdf = PdfReport::default().render("T", "body");
        let text = String::from_utf8_lossy(&pdf);
        let offset: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|n| n.parse().ok())
            .unwrap();

        assert!(pdf[offset..].starts_with(b"xref\n"));
    }

    #[test]
    fn test_characters_outside_latin1_are_replaced() {
        let pdf = PdfReport::default().render("Audit ✓", "Total 💰 due");

        assert!(contains(&pdf, b"(Audit ?) Tj"));
        assert!(contains(&pdf, b"(Total ? due) Tj"));
    }

    #[test]
    fn test_latin1_characters_are_kept_as_octal_escapes() {
        let pdf = PdfReport::default().render("Aduanería", "Importación (CIF)");

        assert!(contains(&pdf, b"(Aduaner\\355a) Tj"));
        assert!(contains(&pdf, b"(Importaci\\363n \\(CIF\\)) Tj"));
    }

    #[test]
    fn test_to_latin1_lossy() {
        assert_eq!(to_latin1_lossy("abc"), b"abc".to_vec());
        assert_eq!(to_latin1_lossy("é€"), vec![0xE9, b'?']);
        assert_eq!(to_latin1_lossy("a\r\nb\tc\u{7}"), b"a\nb c?".to_vec());
        assert_eq!(to_latin1_lossy("\u{85}"), b"?".to_vec());
    }

    #[test]
    fn test_wrap_keeps_paragraphs_and_breaks_long_words() {
        let lines = wrap(b"one two three\n\nfour", 7);
        assert_eq!(
            lines,
            vec![
                b"one two".to_vec(),
                b"three".to_vec(),
                Vec::new(),
                b"four".to_vec()
            ]
        );

        let long = vec![b'x'; 20];
        let lines = wrap(&long, 8);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.len() <= 8));
    }

    #[test]
    fn test_long_body_paginates_with_header_on_every_page() {
        let body: String = (0..200).map(|i| format!("Line {}\n", i)).collect();
        let report = PdfReport::new("REPORTE ADUANERO");

        let pages = report.layout_pages("HISTORY", &body);
        assert!(pages.len() >= 2);
        for page in &pages {
            assert_eq!(page.lines[0].text, b"REPORTE ADUANERO".to_vec());
            assert!(page
                .lines
                .iter()
                .all(|l| l.y <= PAGE_HEIGHT - BOTTOM_MARGIN + BODY_SIZE));
        }

        let pdf = report.render("HISTORY", &body);
        assert_eq!(count(&pdf, b"(REPORTE ADUANERO) Tj"), pages.len());
        assert!(contains(&pdf, format!("/Count {}", pages.len()).as_bytes()));
    }

    #[test]
    fn test_long_title_breaks_onto_new_pages() {
        let title = "WORD ".repeat(800);
        let report = PdfReport::default();

        let pages = report.layout_pages(&title, "body");
        assert!(pages.len() >= 2);
        for page in &pages {
            assert_eq!(page.lines[0].text, b"CUSTOMS REPORT".to_vec());
            assert!(page
                .lines
                .iter()
                .all(|l| l.y > 0.0 && l.y <= PAGE_HEIGHT - BOTTOM_MARGIN + BODY_SIZE));
        }

        let last = pages.last().unwrap().lines.last().unwrap();
        assert_eq!(last.font, Font::Regular);
        assert_eq!(last.text, b"body".to_vec());
    }

    #[test]
    fn test_empty_body_still_renders() {
        let pdf = PdfReport::default().render("", "");
        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(contains(&pdf, b"/Count 1"));
    }
}
