use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Identifier assigned by either CMS. Kept as raw JSON since instances
/// disagree on numeric vs string ids.
pub type RemoteId = Value;

/// 一筆 CMS 內容（欄位名稱 → 值）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry {
    pub fields: Map<String, Value>,
}

impl Entry {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for Entry {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// Result of classifying one field before any rewrite happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Media(Cardinality),
    Relationship(Cardinality),
    Component(Cardinality),
    Plain,
}

/// Relationship allow-list: field name → destination model used for the
/// `old_id` lookup. Without an explicit model the field name is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipFields {
    models: BTreeMap<String, String>,
}

impl RelationshipFields {
    /// Parses `field` or `field:model` items; blank items are ignored so an
    /// empty `RELATIONSHIP_FIELDS` yields an empty set.
    pub fn parse<S: AsRef<str>>(items: &[S]) -> Self {
        let mut models = BTreeMap::new();
        for item in items {
            let item = item.as_ref().trim();
            if item.is_empty() {
                continue;
            }
            let (field, model) = match item.split_once(':') {
                Some((field, model)) if !model.trim().is_empty() => (field.trim(), model.trim()),
                Some((field, _)) => (field.trim(), field.trim()),
                None => (item, item),
            };
            models.insert(field.to_string(), model.to_string());
        }
        Self { models }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.models.contains_key(field)
    }

    pub fn model_for<'a>(&'a self, field: &'a str) -> &'a str {
        self.models.get(field).map(String::as_str).unwrap_or(field)
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.values().map(String::as_str)
    }
}

/// Media uploaded while transforming a single entry. If the entry is never
/// created these become orphans on the destination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedUploads {
    media_ids: Vec<RemoteId>,
}

impl StagedUploads {
    pub fn record(&mut self, id: RemoteId) {
        self.media_ids.push(id);
    }

    pub fn ids(&self) -> &[RemoteId] {
        &self.media_ids
    }

    pub fn is_empty(&self) -> bool {
        self.media_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.media_ids.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Created,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryOutcome {
    pub old_id: RemoteId,
    pub status: OutcomeStatus,
    pub new_id: Option<RemoteId>,
    pub error: Option<String>,
    pub orphaned_media: Vec<RemoteId>,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

impl EntryOutcome {
    pub fn created(old_id: RemoteId, new_id: Option<RemoteId>) -> Self {
        Self {
            old_id,
            status: OutcomeStatus::Created,
            new_id,
            error: None,
            orphaned_media: Vec::new(),
            recorded_at: chrono::Utc::now(),
        }
    }

    pub fn failed(old_id: RemoteId, error: String, orphaned_media: Vec<RemoteId>) -> Self {
        Self {
            old_id,
            status: OutcomeStatus::Failed,
            new_id: None,
            error: Some(error),
            orphaned_media,
            recorded_at: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    pub source_model: String,
    pub destination_model: String,
    pub fetched: usize,
    pub outcomes: Vec<EntryOutcome>,
}

impl MigrationReport {
    pub fn new(source_model: &str, destination_model: &str) -> Self {
        Self {
            source_model: source_model.to_string(),
            destination_model: destination_model.to_string(),
            fetched: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn created(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Created)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Failed)
            .count()
    }

    pub fn orphaned_media(&self) -> usize {
        self.outcomes.iter().map(|o| o.orphaned_media.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_fields_parse() {
        let fields = RelationshipFields::parse(&["author", " tags:tag ", "", "category:"]);

        assert_eq!(fields.len(), 3);
        assert!(fields.contains("author"));
        assert_eq!(fields.model_for("author"), "author");
        assert_eq!(fields.model_for("tags"), "tag");
        assert_eq!(fields.model_for("category"), "category");
        assert!(!fields.contains("cover"));
    }

    #[test]
    fn test_empty_relationship_fields() {
        let fields = RelationshipFields::parse(&[""]);
        assert!(fields.is_empty());
    }

    #[test]
    fn test_report_counts() {
        let mut report = MigrationReport::new("articles", "article");
        report
            .outcomes
            .push(EntryOutcome::created(Value::from(1), Some(Value::from(11))));
        report.outcomes.push(EntryOutcome::failed(
            Value::from(2),
            "boom".to_string(),
            vec![Value::from(7), Value::from(8)],
        ));

        assert_eq!(report.created(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.orphaned_media(), 2);
    }
}
