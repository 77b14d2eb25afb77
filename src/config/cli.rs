use crate::config::{EntryErrorPolicy, MigrationConfig};
use crate::domain::model::RelationshipFields;
use clap::Parser;

/// Every option can come from the environment (or a `.env` file), so the tool
/// runs without flags.
#[derive(Clone, Parser)]
#[command(name = "cms-migrate")]
#[command(about = "Migrate entries, media and relations between headless CMS instances")]
pub struct CliConfig {
    #[arg(long, env = "SOURCE_BASE_URL")]
    pub source_base_url: String,

    #[arg(long, env = "SOURCE_EMAIL")]
    pub source_email: String,

    #[arg(long, env = "SOURCE_PASSWORD", hide_env_values = true)]
    pub source_password: String,

    #[arg(long, env = "SOURCE_MODEL")]
    pub source_model: String,

    #[arg(long = "dest-base-url", env = "DEST_BASE_URL")]
    pub destination_base_url: String,

    #[arg(long = "dest-api-key", env = "DEST_API_KEY", hide_env_values = true)]
    pub destination_api_key: String,

    #[arg(long = "dest-model", env = "DEST_MODEL")]
    pub destination_model: String,

    /// Comma-separated `field` or `field:model` items
    #[arg(long, env = "RELATIONSHIP_FIELDS", value_delimiter = ',')]
    pub relationship_fields: Vec<String>,

    #[arg(long, env = "BATCH_SIZE", default_value = "10")]
    pub batch_size: usize,

    #[arg(long = "timeout", env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub timeout_seconds: u64,

    /// stop | continue
    #[arg(long, env = "ON_ENTRY_ERROR", default_value = "stop")]
    pub on_entry_error: EntryErrorPolicy,

    #[arg(long, env = "CLEANUP_ORPHANS")]
    pub cleanup_orphans: bool,

    /// Deepest component / JSON nesting rewritten before the entry is rejected
    #[arg(long, env = "MAX_COMPONENT_DEPTH", default_value = "16")]
    pub max_component_depth: usize,

    /// Write a per-entry CSV report to this path
    #[arg(long)]
    pub report: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    pub fn to_migration_config(&self) -> MigrationConfig {
        MigrationConfig {
            source_base_url: self.source_base_url.clone(),
            source_email: self.source_email.clone(),
            source_password: self.source_password.clone(),
            source_model: self.source_model.clone(),
            destination_base_url: self.destination_base_url.clone(),
            destination_api_key: self.destination_api_key.clone(),
            destination_model: self.destination_model.clone(),
            relationship_fields: RelationshipFields::parse(self.relationship_fields.as_slice()),
            batch_size: self.batch_size,
            timeout_seconds: self.timeout_seconds,
            on_entry_error: self.on_entry_error,
            cleanup_orphans: self.cleanup_orphans,
            max_component_depth: self.max_component_depth,
        }
    }
}
