//! Point-in-time search snapshots persisted as `index/index_<timestamp>.json`.

use crate::error::Result;
use crate::fs::layout::timestamped_path;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const SNAPSHOT_PREFIX: &str = "index_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub content: String,
    pub category: String,
    pub entry_id: String,
    pub updated: DateTime<Utc>,
}

/// Searchable content keyed by `"<category>/<entry_id>"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub created_at: DateTime<Utc>,
    pub entries: BTreeMap<String, SnapshotEntry>,
}

/// Snapshot key for an entry
pub fn snapshot_key(category: &str, entry_id: &str) -> String {
    format!("{category}/{entry_id}")
}

impl Snapshot {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, entry: SnapshotEntry) {
        self.entries
            .insert(snapshot_key(&entry.category, &entry.entry_id), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a snapshot key or a bare entry id to its key.
    pub fn resolve_key(&self, key_or_id: &str) -> Option<&str> {
        if let Some((key, _)) = self.entries.get_key_value(key_or_id) {
            return Some(key.as_str());
        }
        self.entries
            .iter()
            .find(|(_, entry)| entry.entry_id == key_or_id)
            .map(|(key, _)| key.as_str())
    }

    /// Write the snapshot to a new timestamped file in `dir`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = timestamped_path(dir, SNAPSHOT_PREFIX, self.created_at);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// Load the most recent snapshot in `dir`, by file name order.
    pub fn load_latest(dir: &Path) -> Result<Option<Self>> {
        let Some(path) = latest_snapshot_path(dir) else {
            return Ok(None);
        };
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

fn latest_snapshot_path(dir: &Path) -> Option<PathBuf> {
    let pattern = dir.join(format!("{SNAPSHOT_PREFIX}*.json"));
    let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .ok()?
        .flatten()
        .collect();
    paths.sort();
    paths.pop()
}
