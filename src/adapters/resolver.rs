use crate::adapters::destination::{id_to_query_value, DestinationClient};
use crate::domain::model::RemoteId;
use crate::domain::ports::RelationResolver;
use crate::utils::error::{MigrateError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Looks relations up through the `old_id` filter on the destination and
/// memoizes hits for the rest of the run. Misses are not cached.
pub struct HttpRelationResolver {
    destination: DestinationClient,
    cache: Mutex<HashMap<(String, String), RemoteId>>,
}

impl HttpRelationResolver {
    pub fn new(destination: DestinationClient) -> Self {
        Self {
            destination,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, key: &(String, String)) -> Option<RemoteId> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    fn remember(&self, key: (String, String), id: RemoteId) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, id);
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RelationResolver for HttpRelationResolver {
    async fn resolve(&self, model_name: &str, old_id: &RemoteId) -> Result<RemoteId> {
        let key = (model_name.to_string(), id_to_query_value(old_id));
        if let Some(id) = self.cached(&key) {
            return Ok(id);
        }

        match self.destination.find_by_old_id(model_name, old_id).await? {
            Some(id) => {
                tracing::debug!("🔗 {} old_id {} → {}", model_name, key.1, id);
                self.remember(key, id.clone());
                Ok(id)
            }
            None => Err(MigrateError::NotFoundError {
                model: model_name.to_string(),
                old_id: key.1,
            }),
        }
    }
}
