//! Structured documents stored as knowledge entries.

use crate::error::Result;
use crate::store::{render_metadata, KnowledgeEntry, NewEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const DOCUMENT_SOURCE: &str = "document";

/// A document body with the bookkeeping of the entry that holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub category: String,
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub body: Map<String, Value>,
}

impl Document {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// The object stored under `key`, or an empty map.
    pub fn object(&self, key: &str) -> Map<String, Value> {
        self.body
            .get(key)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// String elements of the array stored under `key`.
    pub fn strings(&self, key: &str) -> Vec<String> {
        self.body
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names listed under `key`: the elements of an array of strings, or
    /// the keys of an object. A missing key lists nothing; any other shape,
    /// including a non-string array element, is `None`.
    pub fn names(&self, key: &str) -> Option<Vec<String>> {
        match self.body.get(key) {
            None => Some(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect(),
            Some(Value::Object(map)) => Some(map.keys().cloned().collect()),
            Some(_) => None,
        }
    }
}

impl From<KnowledgeEntry> for Document {
    fn from(entry: KnowledgeEntry) -> Self {
        Self {
            id: entry.id,
            category: entry.category,
            version: entry.version,
            updated_at: entry.updated_at,
            body: entry.metadata,
        }
    }
}

/// Build the entry fields for a document body.
///
/// The body is kept verbatim as metadata and rendered as YAML into
/// `content` so text search sees it. `tags` and `source` are lifted from the
/// body when present.
pub fn document_entry(category: &str, body: Map<String, Value>) -> Result<NewEntry> {
    let content = render_metadata(&body)?;
    let tags: Vec<String> = body
        .get("tags")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let source = body
        .get("source")
        .and_then(Value::as_str)
        .unwrap_or(DOCUMENT_SOURCE)
        .to_string();
    let confidence = body
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(1.0);

    Ok(NewEntry::new(content, category)
        .with_tags(tags)
        .with_source(source)
        .with_confidence(confidence)
        .with_metadata(body))
}

/// Truthiness of a JSON value: `null`, `false`, zero, empty strings, empty
/// arrays and empty objects are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
