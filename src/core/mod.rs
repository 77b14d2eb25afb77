pub mod etl;
pub mod pipeline;
pub mod report;
pub mod transformer;

pub use crate::domain::model::{
    Entry, EntryOutcome, FieldKind, MigrationReport, OutcomeStatus, RemoteId, StagedUploads,
};
pub use crate::domain::ports::{MediaTransfer, Pipeline, RelationResolver};
pub use crate::utils::error::Result;
