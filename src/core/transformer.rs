use crate::domain::model::{Cardinality, Entry, FieldKind, RelationshipFields, RemoteId, StagedUploads};
use crate::domain::ports::{MediaTransfer, RelationResolver};
use crate::utils::error::{MigrateError, Result};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::pin::Pin;

type BoxedResult<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

fn media_url(value: &Value) -> Option<&str> {
    value
        .as_object()
        .and_then(|map| map.get("url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
}

fn relation_id(value: &Value) -> Option<&Value> {
    value.as_object().and_then(|map| map.get("id"))
}

/// Decides what a field is before anything gets rewritten.
///
/// Media is recognised by a non-empty `url` and is checked first, so an
/// allow-listed field holding an asset is still transferred. Relationship
/// fields are recognised only by name (the allow-list); a mapping with an
/// `id` on any other field is treated as a component. Remaining mappings,
/// and non-empty sequences of mappings, are components.
pub fn classify_field(relationships: &RelationshipFields, field: &str, value: &Value) -> FieldKind {
    match value {
        Value::Object(_) if media_url(value).is_some() => {
            return FieldKind::Media(Cardinality::One)
        }
        Value::Array(items)
            if !items.is_empty() && items.iter().all(|item| media_url(item).is_some()) =>
        {
            return FieldKind::Media(Cardinality::Many)
        }
        _ => {}
    }

    if relationships.contains(field) {
        match value {
            Value::Object(_) if relation_id(value).is_some() => {
                return FieldKind::Relationship(Cardinality::One)
            }
            Value::Array(items) if items.iter().all(|item| relation_id(item).is_some()) => {
                return FieldKind::Relationship(Cardinality::Many)
            }
            _ => {}
        }
    }

    match value {
        Value::Object(_) => FieldKind::Component(Cardinality::One),
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            FieldKind::Component(Cardinality::Many)
        }
        _ => FieldKind::Plain,
    }
}

/// Rewrites media and relation references of an entry into the shapes the
/// destination expects, descending into components.
pub struct EntryTransformer<M, R> {
    media: M,
    resolver: R,
    relationships: RelationshipFields,
    max_depth: usize,
}

impl<M: MediaTransfer, R: RelationResolver> EntryTransformer<M, R> {
    pub fn new(media: M, resolver: R, relationships: RelationshipFields, max_depth: usize) -> Self {
        Self {
            media,
            resolver,
            relationships,
            max_depth,
        }
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn classify(&self, field: &str, value: &Value) -> FieldKind {
        classify_field(&self.relationships, field, value)
    }

    /// Every uploaded media id is recorded in `staged` as soon as the upload
    /// returns, so a later failure still knows what was left behind.
    pub async fn transform(&self, entry: &mut Entry, staged: &mut StagedUploads) -> Result<()> {
        self.transform_map(&mut entry.fields, 0, staged).await
    }

    fn transform_map<'a>(
        &'a self,
        map: &'a mut Map<String, Value>,
        depth: usize,
        staged: &'a mut StagedUploads,
    ) -> BoxedResult<'a> {
        Box::pin(async move {
            let fields: Vec<String> = map.keys().cloned().collect();

            for field in fields {
                let Some(value) = map.get_mut(&field) else {
                    continue;
                };

                match self.classify(&field, value) {
                    FieldKind::Media(cardinality) => {
                        *value = self.rewrite_media(value, cardinality, staged).await?;
                    }
                    FieldKind::Relationship(cardinality) => {
                        *value = self.rewrite_relationship(&field, value, cardinality).await?;
                    }
                    FieldKind::Component(_) => {
                        if depth >= self.max_depth {
                            return Err(MigrateError::ComponentDepthExceeded {
                                field,
                                max_depth: self.max_depth,
                            });
                        }
                        match value {
                            Value::Object(inner) => {
                                self.transform_map(inner, depth + 1, &mut *staged).await?;
                            }
                            Value::Array(items) => {
                                for item in items.iter_mut() {
                                    if let Value::Object(inner) = item {
                                        self.transform_map(inner, depth + 1, &mut *staged).await?;
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                    FieldKind::Plain => {}
                }
            }

            Ok(())
        })
    }

    async fn upload(&self, value: &Value, staged: &mut StagedUploads) -> Result<RemoteId> {
        // classify_field guarantees the url is there
        let url = media_url(value).unwrap_or_default();
        let id = self.media.transfer(url).await?;
        staged.record(id.clone());
        Ok(id)
    }

    async fn rewrite_media(
        &self,
        value: &Value,
        cardinality: Cardinality,
        staged: &mut StagedUploads,
    ) -> Result<Value> {
        match (cardinality, value) {
            (Cardinality::Many, Value::Array(items)) => {
                let mut ids = Vec::with_capacity(items.len());
                for item in items {
                    ids.push(self.upload(item, staged).await?);
                }
                Ok(Value::Array(ids))
            }
            _ => self.upload(value, staged).await,
        }
    }

    async fn rewrite_relationship(
        &self,
        field: &str,
        value: &Value,
        cardinality: Cardinality,
    ) -> Result<Value> {
        let model = self.relationships.model_for(field);
        let old_ids: Vec<&Value> = match (cardinality, value) {
            (Cardinality::Many, Value::Array(items)) => {
                items.iter().filter_map(relation_id).collect()
            }
            _ => relation_id(value).into_iter().collect(),
        };

        let mut connect = Vec::with_capacity(old_ids.len());
        for old_id in old_ids {
            let id = self.resolver.resolve(model, old_id).await?;
            connect.push(json!({ "id": id }));
        }

        Ok(json!({ "connect": connect }))
    }
}
