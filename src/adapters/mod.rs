// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod http;
pub mod report;
pub mod storage;

pub use http::GeminiClient;
pub use report::PdfReport;
pub use storage::SqliteHistoryStore;
