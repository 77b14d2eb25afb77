use crate::adapters::destination::DestinationClient;
use crate::domain::model::RemoteId;
use crate::domain::ports::MediaTransfer;
use crate::utils::error::{MigrateError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use url::Url;

const FALLBACK_FILE_NAME: &str = "media.bin";

/// Downloads from the source CMS into a temp file, then uploads it to the
/// destination. Each transfer owns its own temp file, removed when the
/// transfer ends whether or not the upload worked.
pub struct HttpMediaTransfer {
    client: Client,
    source_base: Url,
    destination: DestinationClient,
    temp_dir: Option<PathBuf>,
}

pub(crate) fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

impl HttpMediaTransfer {
    pub fn new(client: Client, source_base: Url, destination: DestinationClient) -> Self {
        Self {
            client,
            source_base,
            destination,
            temp_dir: None,
        }
    }

    /// Stage downloads under `dir` instead of the system temp directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// 相對路徑以來源 base URL 補齊
    pub fn resolve_url(&self, media_url: &str) -> Result<Url> {
        self.source_base
            .join(media_url)
            .map_err(|e| MigrateError::TransferError {
                url: media_url.to_string(),
                message: format!("cannot resolve against source base: {}", e),
            })
    }

    async fn download(&self, url: &Url) -> Result<NamedTempFile> {
        let transfer_error = |message: String| MigrateError::TransferError {
            url: url.to_string(),
            message,
        };

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transfer_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(transfer_error(format!(
                "download failed (HTTP {})",
                status.as_u16()
            )));
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("cms-migrate-");
        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let mut written = 0usize;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| transfer_error(e.to_string()))?
        {
            file.write_all(&chunk)?;
            written += chunk.len();
        }
        file.flush()?;

        tracing::debug!("Downloaded {} bytes from {}", written, url);
        Ok(file)
    }
}

#[async_trait]
impl MediaTransfer for HttpMediaTransfer {
    async fn transfer(&self, media_url: &str) -> Result<RemoteId> {
        let url = self.resolve_url(media_url)?;
        let file_name = file_name_from_url(&url);

        let staged_file = self.download(&url).await?;
        let uploaded = self
            .destination
            .upload_file(staged_file.path(), &file_name)
            .await;
        // temp file is removed here on both paths
        drop(staged_file);

        let media_id = uploaded?;
        tracing::info!("🖼️ Transferred media {} → id {}", url, media_id);
        Ok(media_id)
    }

    async fn discard(&self, media_id: &RemoteId) -> Result<()> {
        self.destination.delete_upload(media_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn transfer_for(source: &MockServer, destination: &MockServer) -> HttpMediaTransfer {
        let client = Client::new();
        HttpMediaTransfer::new(
            client.clone(),
            Url::parse(&source.base_url()).unwrap(),
            DestinationClient::new(client, &destination.base_url(), "key"),
        )
    }

    #[test]
    fn test_file_name_from_url() {
        let url = Url::parse("http://cms.local/uploads/cover_abc.png").unwrap();
        assert_eq!(file_name_from_url(&url), "cover_abc.png");

        let root = Url::parse("http://cms.local/").unwrap();
        assert_eq!(file_name_from_url(&root), FALLBACK_FILE_NAME);
    }

    #[tokio::test]
    async fn test_transfer_relative_url() {
        let source = MockServer::start();
        let destination = MockServer::start();

        let download = source.mock(|when, then| {
            when.method(GET).path("/uploads/img.png");
            then.status(200).body("png-bytes");
        });
        let upload = destination.mock(|when, then| {
            when.method(POST)
                .path("/api/upload")
                .header("Authorization", "Bearer key")
                .body_contains("png-bytes")
                .body_contains("img.png");
            then.status(200)
                .json_body(json!([{"id": 77, "name": "img.png"}]));
        });

        let media = transfer_for(&source, &destination);
        let id = media.transfer("/uploads/img.png").await.unwrap();

        download.assert();
        upload.assert();
        assert_eq!(id, json!(77));
    }

    #[tokio::test]
    async fn test_transfer_download_failure() {
        let source = MockServer::start();
        let destination = MockServer::start();

        source.mock(|when, then| {
            when.method(GET).path("/missing.png");
            then.status(404);
        });
        let upload = destination.mock(|when, then| {
            when.method(POST).path("/api/upload");
            then.status(200).json_body(json!([{"id": 1}]));
        });

        let media = transfer_for(&source, &destination);
        let err = media.transfer("/missing.png").await.unwrap_err();

        assert!(matches!(err, MigrateError::TransferError { .. }));
        upload.assert_hits(0);
    }

    #[tokio::test]
    async fn test_transfer_upload_without_id() {
        let source = MockServer::start();
        let destination = MockServer::start();

        source.mock(|when, then| {
            when.method(GET).path("/a.jpg");
            then.status(200).body("jpg");
        });
        destination.mock(|when, then| {
            when.method(POST).path("/api/upload");
            then.status(200).json_body(json!([]));
        });

        let media = transfer_for(&source, &destination);
        let err = media.transfer("/a.jpg").await.unwrap_err();

        assert!(matches!(err, MigrateError::TransferError { .. }));
    }

    fn staged_files(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn test_temp_file_removed_after_rejected_upload() {
        let source = MockServer::start();
        let destination = MockServer::start();
        let staging = tempfile::TempDir::new().unwrap();

        source.mock(|when, then| {
            when.method(GET).path("/a.jpg");
            then.status(200).body("jpg");
        });
        let upload = destination.mock(|when, then| {
            when.method(POST).path("/api/upload");
            then.status(500).body("nope");
        });

        let media = transfer_for(&source, &destination).with_temp_dir(staging.path());
        let err = media.transfer("/a.jpg").await.unwrap_err();

        upload.assert();
        assert!(matches!(err, MigrateError::TransferError { .. }));
        assert!(err.to_string().contains("500"));
        assert_eq!(staged_files(&staging), 0);
    }

    #[tokio::test]
    async fn test_temp_file_removed_after_upload() {
        let source = MockServer::start();
        let destination = MockServer::start();
        let staging = tempfile::TempDir::new().unwrap();

        source.mock(|when, then| {
            when.method(GET).path("/a.jpg");
            then.status(200).body("jpg");
        });
        destination.mock(|when, then| {
            when.method(POST).path("/api/upload").body_contains("jpg");
            then.status(200).json_body(json!([{"id": 8}]));
        });

        let media = transfer_for(&source, &destination).with_temp_dir(staging.path());

        assert_eq!(media.transfer("/a.jpg").await.unwrap(), json!(8));
        assert_eq!(staged_files(&staging), 0);
    }

    #[tokio::test]
    async fn test_discard_deletes_upload() {
        let source = MockServer::start();
        let destination = MockServer::start();

        let delete = destination.mock(|when, then| {
            when.method(DELETE).path("/api/upload/files/77");
            then.status(200).json_body(json!({"id": 77}));
        });

        let media = transfer_for(&source, &destination);
        media.discard(&json!(77)).await.unwrap();

        delete.assert();
    }
}
