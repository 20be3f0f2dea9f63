#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub use toml_config::DeskConfig;

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const DEFAULT_CONFIG_FILE: &str = "customs-desk.toml";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL_FAMILY: &str = "gemini";
pub const DEFAULT_FALLBACK_MODELS: [&str; 2] = ["gemini-1.5-flash", "gemini-2.0-flash-lite"];
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;
pub const DEFAULT_DATABASE_PATH: &str = "data_comercio.db";
pub const DEFAULT_REPORT_HEADER: &str = "CUSTOMS REPORT";
