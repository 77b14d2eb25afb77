use crate::adapters::{DestinationClient, HttpMediaTransfer, HttpRelationResolver, SourceClient};
use crate::config::MigrationConfig;
use crate::core::transformer::EntryTransformer;
use crate::core::{Entry, MediaTransfer, Pipeline, RelationResolver, RemoteId, StagedUploads};
use crate::adapters::destination::OLD_ID_FIELD;
use crate::utils::error::{MigrateError, Result};

/// Source-only metadata dropped before an entry is sent to the destination.
pub const STRIPPED_FIELDS: &[&str] = &["id", "created_at", "updated_at"];

/// Moves `id` to `old_id` and removes source timestamps.
pub fn prepare_entry(mut entry: Entry) -> Result<Entry> {
    let old_id = entry
        .get("id")
        .cloned()
        .filter(|id| !id.is_null())
        .ok_or_else(|| MigrateError::MalformedEntry {
            message: "source entry has no id".to_string(),
        })?;

    for field in STRIPPED_FIELDS {
        entry.remove(field);
    }
    entry.insert(OLD_ID_FIELD, old_id);

    Ok(entry)
}

/// One source model → destination model migration over HTTP.
pub struct MigrationPipeline<M, R> {
    config: MigrationConfig,
    source: SourceClient,
    destination: DestinationClient,
    transformer: EntryTransformer<M, R>,
}

impl MigrationPipeline<HttpMediaTransfer, HttpRelationResolver> {
    pub fn from_config(config: &MigrationConfig) -> Result<Self> {
        let client = config.http_client()?;
        let source = SourceClient::new(client.clone(), &config.source_base_url);
        let destination = DestinationClient::new(
            client.clone(),
            &config.destination_base_url,
            &config.destination_api_key,
        );

        let transformer = EntryTransformer::new(
            HttpMediaTransfer::new(client, config.source_url()?, destination.clone()),
            HttpRelationResolver::new(destination.clone()),
            config.relationship_fields.clone(),
            config.max_component_depth,
        );

        Ok(Self::new(config.clone(), source, destination, transformer))
    }
}

impl<M: MediaTransfer, R: RelationResolver> MigrationPipeline<M, R> {
    pub fn new(
        config: MigrationConfig,
        source: SourceClient,
        destination: DestinationClient,
        transformer: EntryTransformer<M, R>,
    ) -> Self {
        Self {
            config,
            source,
            destination,
            transformer,
        }
    }
}

#[async_trait::async_trait]
impl<M: MediaTransfer, R: RelationResolver> Pipeline for MigrationPipeline<M, R> {
    fn source_model(&self) -> &str {
        &self.config.source_model
    }

    fn destination_model(&self) -> &str {
        &self.config.destination_model
    }

    async fn extract(&self) -> Result<Vec<Entry>> {
        tracing::info!("🔐 Authenticating with source CMS...");
        let token = self
            .source
            .login(&self.config.source_email, &self.config.source_password)
            .await?;

        let model = &self.config.source_model;
        let page_size = self.config.batch_size;
        let mut entries = Vec::new();
        let mut page = 1;

        loop {
            tracing::info!("📄 Fetching page {} of '{}'", page, model);
            let batch = self.source.fetch_page(&token, model, page, page_size).await?;
            if batch.is_empty() {
                break;
            }
            entries.extend(batch);
            page += 1;
        }

        Ok(entries)
    }

    async fn transform(&self, entry: Entry, staged: &mut StagedUploads) -> Result<Entry> {
        let mut entry = prepare_entry(entry)?;
        self.transformer.transform(&mut entry, staged).await?;
        Ok(entry)
    }

    async fn load(&self, entry: &Entry) -> Result<Option<RemoteId>> {
        let body = self
            .destination
            .create_entry(&self.config.destination_model, entry)
            .await?;

        Ok(body.pointer("/data/id").cloned())
    }

    async fn release(&self, staged: &StagedUploads) -> Vec<RemoteId> {
        let mut remaining = Vec::new();
        for media_id in staged.ids() {
            match self.transformer.media().discard(media_id).await {
                Ok(()) => tracing::info!("🧹 Removed orphaned media {}", media_id),
                Err(e) => {
                    tracing::warn!("⚠️ Could not remove orphaned media {}: {}", media_id, e);
                    remaining.push(media_id.clone());
                }
            }
        }
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use httpmock::prelude::*;
    use serde_json::json;

    fn entry(value: serde_json::Value) -> Entry {
        match value {
            serde_json::Value::Object(fields) => Entry::new(fields),
            _ => panic!("entry fixture must be an object"),
        }
    }

    #[test]
    fn test_prepare_entry_moves_id() {
        let prepared = prepare_entry(entry(json!({
            "id": 5,
            "title": "A",
            "created_at": "2021-01-01T00:00:00Z",
            "updated_at": "2021-01-02T00:00:00Z",
            "published_at": "2021-01-03T00:00:00Z"
        })))
        .unwrap();

        assert_eq!(
            prepared.into_value(),
            json!({"old_id": 5, "title": "A", "published_at": "2021-01-03T00:00:00Z"})
        );
    }

    #[test]
    fn test_prepare_entry_without_id() {
        let err = prepare_entry(entry(json!({"title": "A"}))).unwrap_err();
        assert!(matches!(err, MigrateError::MalformedEntry { .. }));
    }

    /// N entries with page size P take ceil((N + 1) / P) page requests.
    #[tokio::test]
    async fn test_extract_paginates_until_empty_page() {
        let source = MockServer::start();
        let login = source.mock(|when, then| {
            when.method(POST).path("/admin/login");
            then.status(200).json_body(json!({"data": {"token": "tok"}}));
        });
        let page1 = source.mock(|when, then| {
            when.method(GET).path("/articles").query_param("_start", "0");
            then.status(200).json_body(json!([{"id": 1}, {"id": 2}]));
        });
        let page2 = source.mock(|when, then| {
            when.method(GET).path("/articles").query_param("_start", "2");
            then.status(200).json_body(json!([{"id": 3}, {"id": 4}]));
        });
        let page3 = source.mock(|when, then| {
            when.method(GET).path("/articles").query_param("_start", "4");
            then.status(200).json_body(json!([]));
        });

        let mut config = test_config(&source.base_url(), "http://127.0.0.1:9");
        config.batch_size = 2;
        let pipeline = MigrationPipeline::from_config(&config).unwrap();

        let entries = pipeline.extract().await.unwrap();

        login.assert();
        page1.assert();
        page2.assert();
        page3.assert();
        let ids: Vec<i64> = entries
            .iter()
            .map(|e| e.get("id").unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_extract_fails_on_bad_page() {
        let source = MockServer::start();
        source.mock(|when, then| {
            when.method(POST).path("/admin/login");
            then.status(200).json_body(json!({"data": {"token": "tok"}}));
        });
        source.mock(|when, then| {
            when.method(GET).path("/articles").query_param("_start", "0");
            then.status(200).json_body(json!([{"id": 1}]));
        });
        source.mock(|when, then| {
            when.method(GET).path("/articles").query_param("_start", "1");
            then.status(500);
        });

        let mut config = test_config(&source.base_url(), "http://127.0.0.1:9");
        config.batch_size = 1;
        let pipeline = MigrationPipeline::from_config(&config).unwrap();

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, MigrateError::FetchError { page: 2, .. }));
    }

    #[tokio::test]
    async fn test_release_reports_leftovers() {
        let destination = MockServer::start();
        let removed = destination.mock(|when, then| {
            when.method(DELETE).path("/api/upload/files/1");
            then.status(200).json_body(json!({"id": 1}));
        });
        destination.mock(|when, then| {
            when.method(DELETE).path("/api/upload/files/2");
            then.status(500);
        });

        let config = test_config("http://127.0.0.1:9", &destination.base_url());
        let pipeline = MigrationPipeline::from_config(&config).unwrap();
        let mut staged = StagedUploads::default();
        staged.record(json!(1));
        staged.record(json!(2));

        let remaining = pipeline.release(&staged).await;

        removed.assert();
        assert_eq!(remaining, vec![json!(2)]);
    }
}
