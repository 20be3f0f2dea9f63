use crate::utils::error::{DeskError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Kind of result stored in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Category {
    Calculation,
    ViabilityAnalysis,
    CustomsAudit,
    EnvironmentalAudit,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Calculation,
        Category::ViabilityAnalysis,
        Category::CustomsAudit,
        Category::EnvironmentalAudit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Calculation => "Calculation",
            Category::ViabilityAnalysis => "ViabilityAnalysis",
            Category::CustomsAudit => "CustomsAudit",
            Category::EnvironmentalAudit => "EnvironmentalAudit",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        Category::ALL
            .into_iter()
            .find(|c| c.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| DeskError::ValidationError {
                message: format!("Unknown history category: {}", s),
            })
    }
}

impl TryFrom<String> for Category {
    type Error = DeskError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub category: Category,
    pub payload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TariffInput {
    pub fob: f64,
    pub freight: f64,
    pub insurance: f64,
    pub exchange_rate: f64,
    pub duty_pct: f64,
    pub vat_pct: f64,
}

impl Default for TariffInput {
    fn default() -> Self {
        Self {
            fob: 1000.0,
            freight: 150.0,
            insurance: 25.0,
            exchange_rate: 4000.0,
            duty_pct: 10.0,
            vat_pct: 19.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TariffBreakdown {
    pub input: TariffInput,
    pub cif: f64,
    pub total_local: f64,
}

/// Document image sent alongside an audit prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageAttachment {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mime_type = sniff_image_mime(&data).ok_or_else(|| DeskError::ValidationError {
            message: "Attachment is not a PNG, JPEG, GIF or WEBP image".to_string(),
        })?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            data,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data).map_err(|_| DeskError::ValidationError {
            message: format!(
                "{} is not a PNG, JPEG, GIF or WEBP image",
                path.as_ref().display()
            ),
        })
    }
}

/// Which categories get written to history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistencePolicy {
    categories: HashSet<Category>,
}

impl PersistencePolicy {
    pub fn new<I: IntoIterator<Item = Category>>(categories: I) -> Self {
        Self {
            categories: categories.into_iter().collect(),
        }
    }

    pub fn all() -> Self {
        Self::new(Category::ALL)
    }

    pub fn persists(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }
}

impl Default for PersistencePolicy {
    fn default() -> Self {
        Self::new([Category::Calculation, Category::ViabilityAnalysis])
    }
}

pub const PRODUCT_PLACEHOLDER: &str = "{product}";

/// Prompt text sent to the model for each advisory interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub viability: String,
    pub customs_audit: String,
    pub environmental_audit: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            viability: "Customs expert: assess the viability of importing {product}".to_string(),
            customs_audit: "Audit this customs document:".to_string(),
            environmental_audit:
                "Does this import require an environmental licence (ANLA)?".to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn viability_prompt(&self, product: &str) -> String {
        self.viability.replace(PRODUCT_PLACEHOLDER, product.trim())
    }
}

fn sniff_image_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_text() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!(
            "viability-analysis".parse::<Category>().unwrap(),
            Category::ViabilityAnalysis
        );
        assert_eq!(
            "customs_audit".parse::<Category>().unwrap(),
            Category::CustomsAudit
        );
        assert!("Viabilidad".parse::<Category>().is_err());
    }

    #[test]
    fn test_attachment_mime_sniffing() {
        let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(ImageAttachment::from_bytes(png).unwrap().mime_type, "image/png");

        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        assert_eq!(ImageAttachment::from_bytes(jpeg).unwrap().mime_type, "image/jpeg");

        let mut webp = b"RIFF".to_vec();
        webp.extend_from_slice(&[0, 0, 0, 0]);
        webp.extend_from_slice(b"WEBPVP8 ");
        assert_eq!(ImageAttachment::from_bytes(webp).unwrap().mime_type, "image/webp");

        assert!(ImageAttachment::from_bytes(b"%PDF-1.4".to_vec()).is_err());
        assert!(ImageAttachment::from_bytes(Vec::new()).is_err());
    }

    #[test]
    fn test_default_policy_skips_audits() {
        let policy = PersistencePolicy::default();
        assert!(policy.persists(Category::Calculation));
        assert!(policy.persists(Category::ViabilityAnalysis));
        assert!(!policy.persists(Category::CustomsAudit));
        assert!(!policy.persists(Category::EnvironmentalAudit));
        assert!(PersistencePolicy::all().persists(Category::EnvironmentalAudit));
    }

    #[test]
    fn test_viability_prompt_substitutes_product() {
        let prompts = PromptTemplates::default();
        assert_eq!(
            prompts.viability_prompt("  smart watches from Taiwan "),
            "Customs expert: assess the viability of importing smart watches from Taiwan"
        );
    }

    #[test]
    fn test_tariff_input_defaults() {
        let input = TariffInput::default();
        assert_eq!(input.fob, 1000.0);
        assert_eq!(input.vat_pct, 19.0);
    }
}
