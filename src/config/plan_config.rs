use crate::config::{
    EntryErrorPolicy, MigrationConfig, DEFAULT_BATCH_SIZE, DEFAULT_MAX_COMPONENT_DEPTH,
    DEFAULT_TIMEOUT_SECONDS,
};
use crate::domain::model::RelationshipFields;
use crate::utils::error::{MigrateError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 多個模型依序遷移的計畫檔（TOML）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    pub plan: PlanInfo,
    pub source: SourceSection,
    pub destination: DestinationSection,
    pub defaults: Option<DefaultsSection>,
    pub models: Vec<ModelPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanInfo {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    pub base_url: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationSection {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsSection {
    pub batch_size: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub on_entry_error: Option<EntryErrorPolicy>,
    pub cleanup_orphans: Option<bool>,
    pub max_component_depth: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPair {
    pub source: String,
    pub destination: String,
    pub enabled: Option<bool>,
    pub relationship_fields: Option<Vec<String>>,
    pub batch_size: Option<usize>,
    pub on_entry_error: Option<EntryErrorPolicy>,
}

impl ModelPair {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

impl PlanConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MigrateError::ConfigValidationError {
            field: "plan_toml_parsing".to_string(),
            message: format!("Plan TOML parsing error: {}", e),
        })
    }

    /// `${VAR}` 以環境變數取代，找不到的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MigrateError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Enabled model pairs in declared order, with `only` / `skip` applied.
    pub fn selected_models(&self, only: &[String], skip: &[String]) -> Vec<&ModelPair> {
        self.models
            .iter()
            .filter(|m| m.is_enabled())
            .filter(|m| only.is_empty() || only.iter().any(|name| name == &m.destination))
            .filter(|m| !skip.iter().any(|name| name == &m.destination))
            .collect()
    }

    pub fn migration_config(&self, pair: &ModelPair) -> MigrationConfig {
        let defaults = self.defaults.clone().unwrap_or_default();
        let relationship_fields = pair.relationship_fields.clone().unwrap_or_default();

        MigrationConfig {
            source_base_url: self.source.base_url.clone(),
            source_email: self.source.email.clone(),
            source_password: self.source.password.clone(),
            source_model: pair.source.clone(),
            destination_base_url: self.destination.base_url.clone(),
            destination_api_key: self.destination.api_key.clone(),
            destination_model: pair.destination.clone(),
            relationship_fields: RelationshipFields::parse(relationship_fields.as_slice()),
            batch_size: pair
                .batch_size
                .or(defaults.batch_size)
                .unwrap_or(DEFAULT_BATCH_SIZE),
            timeout_seconds: defaults.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            on_entry_error: pair
                .on_entry_error
                .or(defaults.on_entry_error)
                .unwrap_or_default(),
            cleanup_orphans: defaults.cleanup_orphans.unwrap_or(false),
            max_component_depth: defaults
                .max_component_depth
                .unwrap_or(DEFAULT_MAX_COMPONENT_DEPTH),
        }
    }
}

impl Validate for PlanConfig {
    fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(MigrateError::ConfigValidationError {
                field: "models".to_string(),
                message: "Plan must list at least one model pair".to_string(),
            });
        }

        validation::validate_unique(
            "models.destination",
            self.models.iter().map(|m| m.destination.as_str()),
        )?;

        for pair in &self.models {
            self.migration_config(pair).validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"
[plan]
name = "blog"
description = "Authors before articles"

[source]
base_url = "http://old-cms.local"
email = "admin@example.com"
password = "${CMS_MIGRATE_TEST_PASSWORD}"

[destination]
base_url = "http://new-cms.local"
api_key = "${CMS_MIGRATE_TEST_UNSET_KEY}"

[defaults]
batch_size = 50
on_entry_error = "continue"

[[models]]
source = "writers"
destination = "writer"

[[models]]
source = "articles"
destination = "article"
relationship_fields = ["author:writer", "category"]
batch_size = 20

[[models]]
source = "drafts"
destination = "draft"
enabled = false
"#;

    #[test]
    fn test_plan_parsing_and_env_substitution() {
        std::env::set_var("CMS_MIGRATE_TEST_PASSWORD", "from-env");

        let plan = PlanConfig::from_str(PLAN).unwrap();

        assert_eq!(plan.plan.name, "blog");
        assert_eq!(plan.source.password, "from-env");
        // unknown variables are left as-is
        assert_eq!(plan.destination.api_key, "${CMS_MIGRATE_TEST_UNSET_KEY}");
        assert_eq!(plan.models.len(), 3);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_migration_config_merges_defaults() {
        let plan = PlanConfig::from_str(PLAN).unwrap();

        let writers = plan.migration_config(&plan.models[0]);
        assert_eq!(writers.batch_size, 50);
        assert_eq!(writers.on_entry_error, EntryErrorPolicy::Continue);
        assert!(writers.relationship_fields.is_empty());

        let articles = plan.migration_config(&plan.models[1]);
        assert_eq!(articles.batch_size, 20);
        assert_eq!(articles.relationship_fields.model_for("author"), "writer");
        assert_eq!(articles.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn test_selected_models_respects_order_and_filters() {
        let plan = PlanConfig::from_str(PLAN).unwrap();

        let all: Vec<&str> = plan
            .selected_models(&[], &[])
            .iter()
            .map(|m| m.destination.as_str())
            .collect();
        assert_eq!(all, vec!["writer", "article"]);

        let skipped = plan.selected_models(&[], &["writer".to_string()]);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].destination, "article");

        let only = plan.selected_models(&["writer".to_string()], &[]);
        assert_eq!(only.len(), 1);
    }

    #[test]
    fn test_duplicate_destination_rejected() {
        let content = PLAN.replace("destination = \"article\"", "destination = \"writer\"");
        let plan = PlanConfig::from_str(&content).unwrap();
        assert!(plan.validate().is_err());
    }
}
