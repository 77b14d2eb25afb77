//! Client for the destination CMS REST API, authenticated with an API key.

use crate::domain::model::{Entry, RemoteId};
use crate::utils::error::{MigrateError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::Path;

/// Field on every migrated record that stores the source-side id.
pub const OLD_ID_FIELD: &str = "old_id";

#[derive(Debug, Clone)]
pub struct DestinationClient {
    client: Client,
    base_url: String,
    api_key: String,
}

pub(crate) fn id_to_query_value(id: &RemoteId) -> String {
    match id {
        RemoteId::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl DestinationClient {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Multipart upload of a local file; returns the id of the first asset
    /// in the response array.
    pub async fn upload_file(&self, path: &Path, file_name: &str) -> Result<RemoteId> {
        let endpoint = self.endpoint("upload");
        let transfer_error = |message: String| MigrateError::TransferError {
            url: endpoint.clone(),
            message,
        };

        let bytes = tokio::fs::read(path).await?;
        tracing::debug!("Uploading {} ({} bytes)", file_name, bytes.len());

        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("files", part);

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(transfer_error(format!(
                "upload rejected (HTTP {}): {}",
                status.as_u16(),
                body
            )));
        }

        let uploaded: serde_json::Value = response.json().await?;
        uploaded
            .get(0)
            .and_then(|media| media.get("id"))
            .cloned()
            .ok_or_else(|| transfer_error("upload response carries no media id".to_string()))
    }

    pub async fn delete_upload(&self, media_id: &RemoteId) -> Result<()> {
        let endpoint = self.endpoint(&format!("upload/files/{}", id_to_query_value(media_id)));

        self.client
            .delete(&endpoint)
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// `GET /api/{model}s?filters[old_id][$eq]=..`, first match wins.
    pub async fn find_by_old_id(&self, model: &str, old_id: &RemoteId) -> Result<Option<RemoteId>> {
        let endpoint = self.endpoint(&format!("{}s", model));
        let filter = format!("filters[{}][$eq]", OLD_ID_FIELD);

        let body: serde_json::Value = self
            .client
            .get(&endpoint)
            .bearer_auth(&self.api_key)
            .query(&[(filter.as_str(), id_to_query_value(old_id))])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let first = body
            .get("data")
            .and_then(|data| data.as_array())
            .and_then(|matches| matches.first())
            .and_then(|record| record.get("id"))
            .cloned();

        Ok(first)
    }

    /// `POST /api/{model}` with `{data: entry}`. Only 200 and 201 count as
    /// created; the response body is returned as-is.
    pub async fn create_entry(&self, model: &str, entry: &Entry) -> Result<serde_json::Value> {
        let endpoint = self.endpoint(model);

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "data": entry }))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if status != 200 && status != 201 {
            return Err(MigrateError::CreateError {
                model: model.to_string(),
                status,
                body,
            });
        }

        Ok(serde_json::from_str(&body).unwrap_or(serde_json::Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_find_by_old_id_first_match() {
        let server = MockServer::start();
        let lookup = server.mock(|when, then| {
            when.method(GET)
                .path("/api/authors")
                .query_param("filters[old_id][$eq]", "9")
                .header("Authorization", "Bearer key");
            then.status(200)
                .json_body(json!({"data": [{"id": 42}, {"id": 43}], "meta": {}}));
        });

        let client = DestinationClient::new(Client::new(), &server.base_url(), "key");
        let found = client.find_by_old_id("author", &json!(9)).await.unwrap();

        lookup.assert();
        assert_eq!(found, Some(json!(42)));
    }

    #[tokio::test]
    async fn test_find_by_old_id_no_match() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/authors");
            then.status(200).json_body(json!({"data": []}));
        });

        let client = DestinationClient::new(Client::new(), &server.base_url(), "key");
        let found = client.find_by_old_id("author", &json!("9")).await.unwrap();

        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_create_entry_wraps_payload() {
        let server = MockServer::start();
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/api/article")
                .json_body(json!({"data": {"old_id": 5, "title": "A"}}));
            then.status(201)
                .json_body(json!({"data": {"id": 100, "attributes": {"title": "A"}}}));
        });

        let client = DestinationClient::new(Client::new(), &server.base_url(), "key");
        let mut entry = Entry::default();
        entry.insert("old_id", json!(5));
        entry.insert("title", json!("A"));

        let body = client.create_entry("article", &entry).await.unwrap();

        create.assert();
        assert_eq!(body["data"]["id"], json!(100));
    }

    #[tokio::test]
    async fn test_create_entry_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/article");
            then.status(400)
                .json_body(json!({"error": {"message": "title must be unique"}}));
        });

        let client = DestinationClient::new(Client::new(), &server.base_url(), "key");
        let err = client
            .create_entry("article", &Entry::default())
            .await
            .unwrap_err();

        match err {
            MigrateError::CreateError { status, body, .. } => {
                assert_eq!(status, 400);
                assert!(body.contains("title must be unique"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
