//! Snapshot-based search engine.
//!
//! Queries run against the last loaded snapshot only. Callers that need
//! fresh results call [`SearchEngine::refresh_index`] or
//! [`SearchEngine::refresh_if_stale`] first.

use super::scoring::{jaccard, relevance, token_set};
use super::snapshot::{Snapshot, SnapshotEntry};
use crate::error::Result;
use crate::store::EntryStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const DEFAULT_RELATED_LIMIT: usize = 5;
pub const DEFAULT_RECENT_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub key: String,
    pub category: String,
    pub entry_id: String,
    /// Relevance for text search, similarity for related entries
    pub relevance: f64,
    pub content: String,
    pub updated: DateTime<Utc>,
}

impl SearchHit {
    fn from_snapshot(key: &str, entry: &SnapshotEntry, relevance: f64) -> Self {
        Self {
            key: key.to_string(),
            category: entry.category.clone(),
            entry_id: entry.entry_id.clone(),
            relevance,
            content: entry.content.clone(),
            updated: entry.updated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentUpdate {
    pub category: String,
    pub entry_id: String,
    pub updated: DateTime<Utc>,
}

/// Start of a trailing window of `days` ending now.
///
/// Windows reaching past the representable range start at
/// `DateTime::<Utc>::MIN_UTC`, so they cover everything. Negative windows
/// are empty.
pub fn window_start(days: i64) -> DateTime<Utc> {
    Duration::try_days(days.max(0))
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Sort by descending score, then ascending key so equal scores keep a
/// stable order for a given snapshot.
fn rank(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
}

#[derive(Debug, Clone)]
pub struct SearchEngine {
    snapshots_dir: PathBuf,
    categories: Vec<String>,
    snapshot: Option<Snapshot>,
}

impl SearchEngine {
    /// Open the engine, loading the most recent persisted snapshot if any.
    ///
    /// `categories` are the categories scanned by `refresh_index`. An
    /// unreadable snapshot file is logged and the engine starts empty.
    pub fn open(snapshots_dir: &Path, categories: Vec<String>) -> Self {
        let snapshot = match Snapshot::load_latest(snapshots_dir) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(dir = %snapshots_dir.display(), error = %e, "Failed to load latest snapshot");
                None
            }
        };

        Self {
            snapshots_dir: snapshots_dir.to_path_buf(),
            categories,
            snapshot,
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// When the loaded snapshot was built, or `None` before the first build.
    pub fn snapshot_taken_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.as_ref().map(|s| s.created_at)
    }

    pub fn is_stale(&self, max_age: Duration) -> bool {
        match self.snapshot_taken_at() {
            Some(taken_at) => Utc::now() - taken_at > max_age,
            None => true,
        }
    }

    /// Rebuild the snapshot from every entry in the configured categories,
    /// persist it, and make it the current snapshot.
    pub fn refresh_index(&mut self, store: &EntryStore) -> Result<PathBuf> {
        let mut snapshot = Snapshot::new(Utc::now());

        for category in &self.categories {
            for id in store.list(category)? {
                match store.get(category, &id) {
                    Ok(Some(entry)) => snapshot.insert(SnapshotEntry {
                        content: entry.content,
                        category: category.clone(),
                        entry_id: id,
                        updated: entry.updated_at,
                    }),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(category = %category, id = %id, error = %e, "Skipping entry during indexing");
                    }
                }
            }
        }

        let path = snapshot.save(&self.snapshots_dir)?;
        info!(entries = snapshot.len(), path = %path.display(), "Refreshed search index");
        self.snapshot = Some(snapshot);
        Ok(path)
    }

    /// Rebuild when there is no snapshot or it is older than `max_age`.
    /// `None` never rebuilds. Returns whether a rebuild happened.
    pub fn refresh_if_stale(
        &mut self,
        store: &EntryStore,
        max_age: Option<Duration>,
    ) -> Result<bool> {
        match max_age {
            Some(max_age) if self.is_stale(max_age) => {
                self.refresh_index(store)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Case-insensitive substring search ranked by relevance.
    ///
    /// `categories` restricts results when given; entries whose content does
    /// not contain `query` are excluded.
    pub fn search(
        &self,
        query: &str,
        categories: Option<&[String]>,
        limit: usize,
    ) -> Vec<SearchHit> {
        let Some(snapshot) = &self.snapshot else {
            return Vec::new();
        };

        let mut hits: Vec<SearchHit> = snapshot
            .entries
            .iter()
            .filter(|(_, entry)| categories.is_none_or(|cats| cats.contains(&entry.category)))
            .filter_map(|(key, entry)| {
                let score = relevance(query, &entry.content);
                (score > 0.0).then(|| SearchHit::from_snapshot(key, entry, score))
            })
            .collect();

        rank(&mut hits);
        hits.truncate(limit);
        debug!(query = %query, hits = hits.len(), "Search complete");
        hits
    }

    /// Entries sharing vocabulary with `key_or_id`, ranked by Jaccard
    /// similarity. The entry itself is never returned.
    pub fn get_related(&self, key_or_id: &str, limit: usize) -> Vec<SearchHit> {
        let Some(snapshot) = &self.snapshot else {
            return Vec::new();
        };
        let Some(target_key) = snapshot.resolve_key(key_or_id) else {
            return Vec::new();
        };

        let target_tokens = token_set(&snapshot.entries[target_key].content);
        let mut hits: Vec<SearchHit> = snapshot
            .entries
            .iter()
            .filter(|(key, _)| key.as_str() != target_key)
            .filter_map(|(key, entry)| {
                let similarity = jaccard(&target_tokens, &token_set(&entry.content));
                (similarity > 0.0).then(|| SearchHit::from_snapshot(key, entry, similarity))
            })
            .collect();

        rank(&mut hits);
        hits.truncate(limit);
        hits
    }

    /// Entries updated within the trailing `days`, newest first.
    pub fn get_recent_updates(&self, days: i64) -> Vec<RecentUpdate> {
        self.updated_since(window_start(days))
    }

    /// Entries whose `updated` time is after `cutoff`, newest first.
    pub fn updated_since(&self, cutoff: DateTime<Utc>) -> Vec<RecentUpdate> {
        let Some(snapshot) = &self.snapshot else {
            return Vec::new();
        };

        let mut recent: Vec<RecentUpdate> = snapshot
            .entries
            .values()
            .filter(|entry| entry.updated > cutoff)
            .map(|entry| RecentUpdate {
                category: entry.category.clone(),
                entry_id: entry.entry_id.clone(),
                updated: entry.updated,
            })
            .collect();

        recent.sort_by(|a, b| {
            b.updated
                .cmp(&a.updated)
                .then_with(|| a.category.cmp(&b.category))
                .then_with(|| a.entry_id.cmp(&b.entry_id))
        });
        recent
    }
}
