//! Client for the source CMS (admin login + paginated collection reads).

use crate::domain::model::Entry;
use crate::utils::error::{MigrateError, Result};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    data: LoginData,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Clone)]
pub struct SourceClient {
    client: Client,
    base_url: String,
}

impl SourceClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `POST /admin/login`，回傳 bearer token
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let endpoint = format!("{}/admin/login", self.base_url);
        tracing::debug!("Making login request to: {}", endpoint);

        let response = self
            .client
            .post(&endpoint)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| MigrateError::AuthError {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MigrateError::AuthError {
                message: format!("HTTP {}: {}", status.as_u16(), body),
            });
        }

        let login: LoginResponse = response.json().await.map_err(|e| MigrateError::AuthError {
            message: format!("Login response has no data.token: {}", e),
        })?;

        Ok(login.data.token)
    }

    /// Reads one page (1-based) of `model`. An empty vector marks the end of
    /// the collection.
    pub async fn fetch_page(
        &self,
        token: &str,
        model: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Entry>> {
        let endpoint = format!("{}/{}", self.base_url, model);
        let start = (page - 1) * page_size;
        let fetch_error = |message: String| MigrateError::FetchError {
            model: model.to_string(),
            page,
            message,
        };

        let response = self
            .client
            .get(&endpoint)
            .bearer_auth(token)
            .query(&[("_limit", page_size), ("_start", start)])
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        tracing::debug!("Page {} of '{}' responded with {}", page, model, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fetch_error(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let items: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| fetch_error(format!("Expected a JSON array of entries: {}", e)))?;

        items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::Object(fields) => Ok(Entry::new(fields)),
                other => Err(fetch_error(format!("Entry is not an object: {}", other))),
            })
            .collect()
    }
}
