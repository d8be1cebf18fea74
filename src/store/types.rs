//! Knowledge entry record and the request types used to create, update and
//! query entries.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single stored knowledge record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u32,
    pub confidence: f64,
    /// Ids of related entries; not checked for existence or cycles
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl KnowledgeEntry {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether `content` is the YAML rendering of `metadata`, as it is for
    /// structured documents.
    pub fn is_document(&self) -> bool {
        !self.metadata.is_empty()
            && render_metadata(&self.metadata).is_ok_and(|yaml| yaml == self.content)
    }
}

/// YAML rendering of a metadata body, used as the searchable content of
/// documents.
pub fn render_metadata(metadata: &Map<String, Value>) -> Result<String> {
    Ok(serde_yaml::to_string(metadata)?)
}

/// Clamp a confidence score into `[0.0, 1.0]`. NaN becomes 0.0.
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Fields for a new entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub source: String,
    pub confidence: f64,
    pub references: Vec<String>,
    pub metadata: Map<String, Value>,
}

impl NewEntry {
    pub fn new(content: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            category: category.into(),
            tags: Vec::new(),
            source: String::new(),
            confidence: 1.0,
            references: Vec::new(),
            metadata: Map::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_references<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = references.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Partial update: `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryUpdate {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Merged into the stored metadata key by key
    pub metadata: Option<Map<String, Value>>,
    pub confidence: Option<f64>,
}

impl EntryUpdate {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.tags.is_none()
            && self.metadata.is_none()
            && self.confidence.is_none()
    }

    /// Apply the provided fields to `entry`, returning tags that were not
    /// present before.
    pub(crate) fn apply(self, entry: &mut KnowledgeEntry) -> Vec<String> {
        let mut added_tags = Vec::new();

        if let Some(content) = self.content {
            entry.content = content;
        }
        if let Some(tags) = self.tags {
            added_tags = tags
                .iter()
                .filter(|t| !entry.has_tag(t))
                .cloned()
                .collect();
            entry.tags = tags;
        }
        if let Some(metadata) = self.metadata {
            entry.metadata.extend(metadata);
        }
        if let Some(confidence) = self.confidence {
            entry.confidence = clamp_confidence(confidence);
        }

        added_tags
    }
}

/// Filters for a linear scan over stored entries.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryQuery {
    /// Case-insensitive substring of `content`
    pub text: Option<String>,
    pub category: Option<String>,
    /// Every listed tag must be present
    pub tags: Vec<String>,
    pub min_confidence: f64,
    pub limit: usize,
}

impl Default for EntryQuery {
    fn default() -> Self {
        Self {
            text: None,
            category: None,
            tags: Vec::new(),
            min_confidence: 0.0,
            limit: 10,
        }
    }
}

impl EntryQuery {
    pub fn matches(&self, entry: &KnowledgeEntry) -> bool {
        if let Some(category) = &self.category {
            if &entry.category != category {
                return false;
            }
        }
        if !self.tags.iter().all(|t| entry.has_tag(t)) {
            return false;
        }
        if entry.confidence < self.min_confidence {
            return false;
        }
        if let Some(text) = &self.text {
            if !entry.content.to_lowercase().contains(&text.to_lowercase()) {
                return false;
            }
        }
        true
    }
}
