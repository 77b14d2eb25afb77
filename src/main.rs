use clap::Parser;
use cms_migrate::core::report;
use cms_migrate::utils::error::{ErrorSeverity, MigrateError};
use cms_migrate::utils::{logger, validation::Validate};
use cms_migrate::{CliConfig, EtlEngine, MigrationPipeline, MigrationReport};

fn exit_code(e: &MigrateError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report_failure(e: &MigrateError) {
    tracing::error!(
        "❌ Migration failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}

fn write_report(cli: &CliConfig, migration: &MigrationReport) -> anyhow::Result<()> {
    if let Some(path) = &cli.report {
        report::write_csv(std::slice::from_ref(migration), path)?;
        tracing::info!("📝 Report written to {}", path);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 可選
    dotenv::dotenv().ok();

    let cli = CliConfig::parse();
    logger::init_logger(cli.verbose, cli.json_logs);

    let config = cli.to_migration_config();
    tracing::info!("Starting cms-migrate");
    tracing::debug!("Migration config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let pipeline = match MigrationPipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            report_failure(&e);
            std::process::exit(exit_code(&e));
        }
    };
    let engine = EtlEngine::from_config(pipeline, &config);

    match engine.run().await {
        Ok(migration) => {
            report::log_summary(&migration);
            write_report(&cli, &migration)?;
            println!(
                "✅ Migration complete: {} created, {} failed",
                migration.created(),
                migration.failed()
            );
        }
        Err(aborted) => {
            report_failure(&aborted.error);
            // 已建立的 entry 仍要留下紀錄
            report::log_summary(&aborted.report);
            write_report(&cli, &aborted.report)?;
            let code = exit_code(&aborted.error);
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
