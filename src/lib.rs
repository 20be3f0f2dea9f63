pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Cli;

pub use adapters::{GeminiClient, PdfReport, SqliteHistoryStore};
pub use config::DeskConfig;
pub use crate::core::desk::{AdvisoryOutcome, CalculationOutcome, CustomsDesk, PersistOutcome};
pub use utils::error::{AdvisoryError, DeskError, Result};
