use clap::Parser;
use customs_desk::adapters::storage::export_csv;
use customs_desk::config::cli::{AuditArgs, Command, HistoryArgs, ViabilityArgs};
use customs_desk::core::tariff::format_amount;
use customs_desk::core::{ConfigProvider, HistoryStore, ImageAttachment};
use customs_desk::utils::error::ErrorSeverity;
use customs_desk::utils::{logger, validation::Validate};
use customs_desk::{
    AdvisoryOutcome, Cli, CustomsDesk, DeskConfig, DeskError, GeminiClient, PdfReport,
    PersistOutcome, SqliteHistoryStore,
};
use std::path::Path;

type Desk = CustomsDesk<GeminiClient, SqliteHistoryStore, PdfReport>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚢 Starting customs-desk");

    let mut config = match DeskConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    if let Some(database) = &cli.database {
        config.storage.database_path = database.clone();
        tracing::info!("🔧 Database path overridden to: {}", database);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    let store = SqliteHistoryStore::new(config.database_path());
    if let Err(e) = store.initialize() {
        // Calculations still work without history.
        tracing::warn!("History unavailable: {}", e);
        eprintln!("⚠️ {}", e.user_friendly_message());
    }

    let gateway = match GeminiClient::from_config(&config) {
        Ok(gateway) => gateway,
        Err(e) => exit_with(&e),
    };

    let desk = CustomsDesk::new(gateway, store, PdfReport::new(config.report_header()))
        .with_policy(config.persistence_policy())
        .with_prompts(config.prompts().clone());

    let result = match cli.command {
        Command::Calc(args) => {
            run_calc(&desk, &args);
            Ok(())
        }
        Command::Viability(args) => run_viability(&desk, &args).await,
        Command::AuditCustoms(args) => run_audit(&desk, &args, false).await,
        Command::AuditEnvironmental(args) => run_audit(&desk, &args, true).await,
        Command::History(args) => run_history(&desk, &args),
        Command::Models => {
            run_models(&desk).await;
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Interaction failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        exit_with(&e);
    }

    Ok(())
}

fn exit_with(e: &DeskError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}

fn report_history(outcome: &PersistOutcome) {
    match outcome {
        PersistOutcome::Saved(record) => println!("💾 Saved as history record #{}", record.id),
        PersistOutcome::Skipped => {}
        PersistOutcome::Failed(e) => {
            eprintln!("⚠️ Result not saved: {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
        }
    }
}

fn run_calc(desk: &Desk, args: &customs_desk::config::cli::CalcArgs) {
    let outcome = desk.calculate(args.to_input(), args.save);

    println!("📊 Result");
    println!("  CIF (USD): {:.2}", outcome.breakdown.cif);
    println!(
        "  Total to pay (local currency): ${}",
        format_amount(outcome.breakdown.total_local)
    );

    if args.save && matches!(outcome.history, PersistOutcome::Skipped) {
        println!("ℹ️ Calculation history is disabled in the configuration");
    }
    report_history(&outcome.history);
}

fn write_report(outcome: &AdvisoryOutcome, path: Option<&Path>) -> customs_desk::Result<()> {
    if let Some(path) = path {
        std::fs::write(path, &outcome.report)?;
        println!("📄 Report saved to: {}", path.display());
    }
    Ok(())
}

fn print_outcome(outcome: &AdvisoryOutcome, pdf: Option<&Path>) -> customs_desk::Result<()> {
    println!("{}", outcome.text);
    println!();
    report_history(&outcome.history);
    write_report(outcome, pdf)
}

async fn run_viability(desk: &Desk, args: &ViabilityArgs) -> customs_desk::Result<()> {
    let model = desk.resolve_model(args.model.as_deref()).await?;
    let outcome = desk.analyze_viability(&args.product, &model).await?;
    print_outcome(&outcome, args.pdf.as_deref())
}

async fn run_audit(desk: &Desk, args: &AuditArgs, environmental: bool) -> customs_desk::Result<()> {
    let image = ImageAttachment::from_path(&args.document)?;
    let model = desk.resolve_model(args.model.as_deref()).await?;

    let outcome = if environmental {
        desk.audit_environmental_document(&image, &model).await?
    } else {
        desk.audit_customs_document(&image, &model).await?
    };
    print_outcome(&outcome, args.pdf.as_deref())
}

fn run_history(desk: &Desk, args: &HistoryArgs) -> customs_desk::Result<()> {
    let records = desk.history()?;

    if let Some(path) = &args.export {
        let file = std::fs::File::create(path)?;
        export_csv(&records, file)?;
        println!("📁 Exported {} records to: {}", records.len(), path.display());
        return Ok(());
    }

    if records.is_empty() {
        println!("History is empty");
        return Ok(());
    }

    for record in &records {
        println!(
            "#{:<5} {}  {}",
            record.id,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.category
        );
        for line in record.payload.lines() {
            println!("       {}", line);
        }
    }
    Ok(())
}

async fn run_models(desk: &Desk) {
    let models = desk.available_models().await;
    println!("🧠 Available models:");
    for (i, model) in models.iter().enumerate() {
        if i == 0 {
            println!("  {} (default)", model);
        } else {
            println!("  {}", model);
        }
    }
}
