use crate::domain::model::TariffInput;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "customs-desk")]
#[command(about = "Customs duty estimation and AI-assisted document review")]
pub struct Cli {
    /// Path to TOML configuration file (defaults to ./customs-desk.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the history database path
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute the landed cost of an import
    Calc(CalcArgs),

    /// Ask the model whether importing a product is viable
    Viability(ViabilityArgs),

    /// Audit a customs document image
    AuditCustoms(AuditArgs),

    /// Check whether a document's goods need an environmental licence
    AuditEnvironmental(AuditArgs),

    /// List saved calculations and analyses, newest first
    History(HistoryArgs),

    /// List the models offered by the provider
    Models,
}

#[derive(Debug, Args)]
pub struct CalcArgs {
    /// FOB value (USD)
    #[arg(long, default_value_t = 1000.0, allow_negative_numbers = true)]
    pub fob: f64,

    /// Freight (USD)
    #[arg(long, default_value_t = 150.0, allow_negative_numbers = true)]
    pub freight: f64,

    /// Insurance (USD)
    #[arg(long, default_value_t = 25.0, allow_negative_numbers = true)]
    pub insurance: f64,

    /// Exchange rate to local currency
    #[arg(long, default_value_t = 4000.0, allow_negative_numbers = true)]
    pub exchange_rate: f64,

    /// Duty percentage
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    pub duty: f64,

    /// VAT percentage
    #[arg(long, default_value_t = 19.0, allow_negative_numbers = true)]
    pub vat: f64,

    /// Save the result to history
    #[arg(long)]
    pub save: bool,
}

impl CalcArgs {
    pub fn to_input(&self) -> TariffInput {
        TariffInput {
            fob: self.fob,
            freight: self.freight,
            insurance: self.insurance,
            exchange_rate: self.exchange_rate,
            duty_pct: self.duty,
            vat_pct: self.vat,
        }
    }
}

#[derive(Debug, Args)]
pub struct ViabilityArgs {
    /// Product description, e.g. "smart watches from Taiwan"
    pub product: String,

    /// Model to use (defaults to the first discovered model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Write the answer as a PDF report
    #[arg(long)]
    pub pdf: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Document image (PNG, JPEG, GIF or WEBP)
    pub document: PathBuf,

    /// Model to use (defaults to the first discovered model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Write the answer as a PDF report
    #[arg(long)]
    pub pdf: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Export the listing as CSV instead of printing it
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_defaults_match_prefill() {
        let cli = Cli::try_parse_from(["customs-desk", "calc"]).unwrap();
        match cli.command {
            Command::Calc(args) => {
                assert_eq!(args.to_input(), TariffInput::default());
                assert!(!args.save);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_calc_accepts_overrides_and_negative_values() {
        let cli = Cli::try_parse_from([
            "customs-desk",
            "calc",
            "--fob",
            "-5",
            "--vat",
            "0",
            "--save",
        ])
        .unwrap();
        match cli.command {
            Command::Calc(args) => {
                assert_eq!(args.fob, -5.0);
                assert_eq!(args.vat, 0.0);
                assert!(args.save);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "customs-desk",
            "viability",
            "coffee machines",
            "--model",
            "gemini-2.0-flash",
            "--database",
            "/tmp/h.db",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.database.as_deref(), Some("/tmp/h.db"));
        match cli.command {
            Command::Viability(args) => {
                assert_eq!(args.product, "coffee machines");
                assert_eq!(args.model.as_deref(), Some("gemini-2.0-flash"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_audit_requires_document() {
        assert!(Cli::try_parse_from(["customs-desk", "audit-customs"]).is_err());
        assert!(Cli::try_parse_from(["customs-desk", "audit-environmental", "doc.png"]).is_ok());
    }
}
