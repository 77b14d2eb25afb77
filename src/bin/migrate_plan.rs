use clap::Parser;
use cms_migrate::config::plan_config::{ModelPair, PlanConfig};
use cms_migrate::core::report;
use cms_migrate::utils::{logger, validation::Validate};
use cms_migrate::{EtlEngine, MigrationAborted, MigrationPipeline, MigrationReport};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "migrate-plan")]
#[command(about = "Run several model migrations in the order a TOML plan declares")]
struct Args {
    /// Path to the migration plan
    #[arg(short, long, default_value = "migration-plan.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    json_logs: bool,

    /// Show the execution order without migrating anything
    #[arg(long)]
    dry_run: bool,

    /// Migrate only these destination models (comma-separated)
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,

    /// Skip these destination models (comma-separated)
    #[arg(long, value_delimiter = ',')]
    skip: Vec<String>,

    /// Write a per-entry CSV report for the whole plan
    #[arg(long)]
    report: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    logger::init_logger(args.verbose, args.json_logs);

    tracing::info!("🚀 Starting migration plan runner");
    tracing::info!("📁 Loading plan from: {}", args.config);

    let plan = match PlanConfig::from_file(&args.config) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("❌ Failed to load plan file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = plan.validate() {
        tracing::error!("❌ Plan validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let run_id = format!("plan_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"));
    let selected = plan.selected_models(&args.only, &args.skip);
    display_plan_summary(&plan, &selected, &run_id, args.dry_run);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be migrated");
        return Ok(());
    }

    let started = Instant::now();
    let mut reports: Vec<MigrationReport> = Vec::new();

    for (index, pair) in selected.iter().enumerate() {
        tracing::info!(
            "📦 [{}/{}] {} → {}",
            index + 1,
            selected.len(),
            pair.source,
            pair.destination
        );

        let config = plan.migration_config(pair);
        let result = match MigrationPipeline::from_config(&config) {
            Ok(pipeline) => EtlEngine::from_config(pipeline, &config).run().await,
            Err(error) => Err(MigrationAborted {
                report: MigrationReport::new(&pair.source, &pair.destination),
                error,
            }),
        };

        match result {
            Ok(migration) => {
                report::log_summary(&migration);
                reports.push(migration);
            }
            Err(MigrationAborted { report: partial, error }) => {
                // later models usually relate to this one, so stop here
                tracing::error!("❌ '{}' failed, stopping plan: {}", pair.destination, error);
                eprintln!("❌ {}", error.user_friendly_message());
                eprintln!("💡 {}", error.recovery_suggestion());
                report::log_summary(&partial);
                reports.push(partial);
                if let Some(path) = &args.report {
                    report::write_csv(&reports, path)?;
                }
                std::process::exit(1);
            }
        }
    }

    if let Some(path) = &args.report {
        report::write_csv(&reports, path)?;
    }

    let created: usize = reports.iter().map(|r| r.created()).sum();
    let failed: usize = reports.iter().map(|r| r.failed()).sum();
    println!("✅ Plan '{}' complete ({})", plan.plan.name, run_id);
    println!(
        "📊 Models: {}, created: {}, failed: {}, time: {:?}",
        reports.len(),
        created,
        failed,
        started.elapsed()
    );

    Ok(())
}

fn display_plan_summary(plan: &PlanConfig, selected: &[&ModelPair], run_id: &str, dry_run: bool) {
    println!("📋 Migration Plan Summary:");
    println!("  Name: {}", plan.plan.name);
    if let Some(description) = &plan.plan.description {
        println!("  Description: {}", description);
    }
    println!("  Run ID: {}", run_id);
    println!("  Source: {}", plan.source.base_url);
    println!("  Destination: {}", plan.destination.base_url);
    if dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
    println!("📝 Execution Order:");
    for (index, pair) in selected.iter().enumerate() {
        let config = plan.migration_config(pair);
        println!(
            "  {}. {} → {} (batch size {}, on error: {})",
            index + 1,
            pair.source,
            pair.destination,
            config.batch_size,
            config.on_entry_error
        );
        if !config.relationship_fields.is_empty() {
            let fields = pair.relationship_fields.clone().unwrap_or_default();
            println!("     Relations: {}", fields.join(", "));
        }
    }

    let skipped: Vec<&str> = plan
        .models
        .iter()
        .filter(|m| !selected.iter().any(|s| s.destination == m.destination))
        .map(|m| m.destination.as_str())
        .collect();
    if !skipped.is_empty() {
        println!("  ⏭️ Not running: {}", skipped.join(", "));
    }
    println!();
}
