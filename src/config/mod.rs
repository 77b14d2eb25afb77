#[cfg(feature = "cli")]
pub mod cli;
pub mod plan_config;

use crate::domain::model::RelationshipFields;
use crate::utils::error::{MigrateError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_MAX_COMPONENT_DEPTH: usize = 16;

/// 單筆 entry 失敗時整個遷移要不要停下來
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryErrorPolicy {
    #[default]
    Stop,
    Continue,
}

impl FromStr for EntryErrorPolicy {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stop" => Ok(Self::Stop),
            "continue" => Ok(Self::Continue),
            other => Err(MigrateError::InvalidConfigValueError {
                field: "on_entry_error".to_string(),
                value: other.to_string(),
                reason: "Expected 'stop' or 'continue'".to_string(),
            }),
        }
    }
}

impl fmt::Display for EntryErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => write!(f, "stop"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

/// Everything one source → destination model migration needs. Built from the
/// CLI/environment or from one `[[models]]` item of a migration plan.
#[derive(Clone)]
pub struct MigrationConfig {
    pub source_base_url: String,
    pub source_email: String,
    pub source_password: String,
    pub source_model: String,
    pub destination_base_url: String,
    pub destination_api_key: String,
    pub destination_model: String,
    pub relationship_fields: RelationshipFields,
    pub batch_size: usize,
    pub timeout_seconds: u64,
    pub on_entry_error: EntryErrorPolicy,
    pub cleanup_orphans: bool,
    pub max_component_depth: usize,
}

impl MigrationConfig {
    pub fn source_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.source_base_url)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn http_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder().timeout(self.timeout()).build()?)
    }
}

// Credentials stay out of debug logs.
impl fmt::Debug for MigrationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationConfig")
            .field("source_base_url", &self.source_base_url)
            .field("source_email", &self.source_email)
            .field("source_password", &"***")
            .field("source_model", &self.source_model)
            .field("destination_base_url", &self.destination_base_url)
            .field("destination_api_key", &"***")
            .field("destination_model", &self.destination_model)
            .field("relationship_fields", &self.relationship_fields)
            .field("batch_size", &self.batch_size)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("on_entry_error", &self.on_entry_error)
            .field("cleanup_orphans", &self.cleanup_orphans)
            .field("max_component_depth", &self.max_component_depth)
            .finish()
    }
}

impl Validate for MigrationConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("source_base_url", &self.source_base_url)?;
        validation::validate_url("destination_base_url", &self.destination_base_url)?;
        validation::validate_non_empty_string("source_email", &self.source_email)?;
        validation::validate_non_empty_string("source_password", &self.source_password)?;
        validation::validate_non_empty_string("destination_api_key", &self.destination_api_key)?;
        validation::validate_model_name("source_model", &self.source_model)?;
        validation::validate_model_name("destination_model", &self.destination_model)?;
        for model in self.relationship_fields.models() {
            validation::validate_model_name("relationship_fields", model)?;
        }
        validation::validate_positive_number("batch_size", self.batch_size, 1)?;
        validation::validate_positive_number("timeout_seconds", self.timeout_seconds as usize, 1)?;
        validation::validate_positive_number("max_component_depth", self.max_component_depth, 1)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config(source: &str, destination: &str) -> MigrationConfig {
    MigrationConfig {
        source_base_url: source.to_string(),
        source_email: "admin@example.com".to_string(),
        source_password: "secret".to_string(),
        source_model: "articles".to_string(),
        destination_base_url: destination.to_string(),
        destination_api_key: "dest-key".to_string(),
        destination_model: "article".to_string(),
        relationship_fields: RelationshipFields::default(),
        batch_size: DEFAULT_BATCH_SIZE,
        timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        on_entry_error: EntryErrorPolicy::Stop,
        cleanup_orphans: false,
        max_component_depth: DEFAULT_MAX_COMPONENT_DEPTH,
    }
}
