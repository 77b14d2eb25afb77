pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{plan_config::PlanConfig, EntryErrorPolicy, MigrationConfig};
pub use core::{
    etl::{EtlEngine, MigrationAborted},
    pipeline::MigrationPipeline,
    transformer::EntryTransformer,
};
pub use domain::model::{Entry, MigrationReport, RelationshipFields};
pub use utils::error::{MigrateError, Result};
