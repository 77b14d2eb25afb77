use crate::domain::model::{Entry, RemoteId, StagedUploads};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Moves one binary asset from the source CMS to the destination CMS.
#[async_trait]
pub trait MediaTransfer: Send + Sync {
    /// Returns the id the destination assigned to the uploaded copy.
    async fn transfer(&self, media_url: &str) -> Result<RemoteId>;

    /// Removes an upload that no created entry references.
    async fn discard(&self, media_id: &RemoteId) -> Result<()>;
}

/// Maps a source-side id onto the id of the already migrated destination record.
#[async_trait]
pub trait RelationResolver: Send + Sync {
    async fn resolve(&self, model_name: &str, old_id: &RemoteId) -> Result<RemoteId>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    fn source_model(&self) -> &str;
    fn destination_model(&self) -> &str;

    async fn extract(&self) -> Result<Vec<Entry>>;
    async fn transform(&self, entry: Entry, staged: &mut StagedUploads) -> Result<Entry>;
    async fn load(&self, entry: &Entry) -> Result<Option<RemoteId>>;

    /// Tries to remove staged uploads of an entry that was not created.
    /// Returns the ids that are still orphaned afterwards.
    async fn release(&self, staged: &StagedUploads) -> Vec<RemoteId>;
}
