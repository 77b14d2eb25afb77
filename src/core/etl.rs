use crate::config::{EntryErrorPolicy, MigrationConfig};
use crate::core::{Entry, EntryOutcome, MigrationReport, Pipeline, RemoteId, StagedUploads};
use crate::utils::error::{MigrateError, Result};

/// A run that stopped early, with everything recorded up to that point.
/// Entries listed as created already exist on the destination.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct MigrationAborted {
    pub report: MigrationReport,
    pub error: MigrateError,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    policy: EntryErrorPolicy,
    cleanup_orphans: bool,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            policy: EntryErrorPolicy::Stop,
            cleanup_orphans: false,
        }
    }

    pub fn from_config(pipeline: P, config: &MigrationConfig) -> Self {
        Self::new(pipeline)
            .with_policy(config.on_entry_error)
            .with_orphan_cleanup(config.cleanup_orphans)
    }

    pub fn with_policy(mut self, policy: EntryErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_orphan_cleanup(mut self, enabled: bool) -> Self {
        self.cleanup_orphans = enabled;
        self
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Fetch everything, then create entries one by one in source order.
    pub async fn run(&self) -> std::result::Result<MigrationReport, MigrationAborted> {
        let mut report = MigrationReport::new(
            self.pipeline.source_model(),
            self.pipeline.destination_model(),
        );
        tracing::info!(
            "🚀 Migrating '{}' → '{}'",
            report.source_model,
            report.destination_model
        );

        // Extract
        let entries = match self.pipeline.extract().await {
            Ok(entries) => entries,
            Err(error) => return Err(MigrationAborted { report, error }),
        };
        report.fetched = entries.len();
        tracing::info!("📥 Fetched {} entries", entries.len());

        // Transform + Load，一次一筆
        tracing::info!("📤 Creating entries in '{}'...", report.destination_model);
        for entry in entries {
            let old_id = entry.get("id").cloned().unwrap_or(RemoteId::Null);
            let mut staged = StagedUploads::default();

            match self.migrate_entry(entry, &mut staged).await {
                Ok(new_id) => {
                    tracing::info!(
                        "✅ Migrated entry old_id={} → id={}",
                        old_id,
                        new_id.as_ref().unwrap_or(&RemoteId::Null)
                    );
                    report.outcomes.push(EntryOutcome::created(old_id, new_id));
                }
                Err(e) => {
                    let orphaned = self.handle_orphans(&staged).await;
                    let outcome = EntryOutcome::failed(old_id.clone(), e.to_string(), orphaned);
                    report.outcomes.push(outcome);

                    if !self.continues_after(&e) {
                        tracing::error!("❌ Entry old_id={} aborted the migration: {}", old_id, e);
                        return Err(MigrationAborted { report, error: e });
                    }

                    tracing::warn!("⚠️ Entry old_id={} failed: {}", old_id, e);
                }
            }
        }

        tracing::info!(
            "🏁 Migration of '{}' complete: {} created, {} failed",
            report.destination_model,
            report.created(),
            report.failed()
        );
        Ok(report)
    }

    /// All uploads and lookups for the entry happen before the create call,
    /// so nothing is created from a half-transformed entry.
    async fn migrate_entry(
        &self,
        entry: Entry,
        staged: &mut StagedUploads,
    ) -> Result<Option<RemoteId>> {
        let transformed = self.pipeline.transform(entry, staged).await?;

        match self.pipeline.load(&transformed).await {
            Ok(new_id) => Ok(new_id),
            Err(e) => {
                if let MigrateError::CreateError { body, .. } = &e {
                    tracing::error!(
                        "Failed to create entry: {}",
                        serde_json::to_string(&transformed).unwrap_or_default()
                    );
                    tracing::error!("Response: {}", body);
                }
                Err(e)
            }
        }
    }

    fn continues_after(&self, error: &MigrateError) -> bool {
        match error {
            MigrateError::CreateError { .. } => true,
            e if e.is_entry_scoped() => self.policy == EntryErrorPolicy::Continue,
            _ => false,
        }
    }

    async fn handle_orphans(&self, staged: &StagedUploads) -> Vec<RemoteId> {
        if staged.is_empty() {
            return Vec::new();
        }

        if self.cleanup_orphans {
            return self.pipeline.release(staged).await;
        }

        tracing::warn!(
            "⚠️ {} uploaded media left without an entry: {:?}",
            staged.len(),
            staged.ids()
        );
        staged.ids().to_vec()
    }
}
