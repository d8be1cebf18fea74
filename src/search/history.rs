//! Search log: query/result pairs kept under `search_results/` for later
//! analysis of how the knowledge base is used.

use super::engine::{window_start, SearchHit};
use crate::error::Result;
use crate::fs::layout::timestamped_path;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const RECORD_PREFIX: &str = "search_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub query: String,
    /// Who ran the search (agent, command, tool)
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    pub count: usize,
    pub total_results: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMetrics {
    pub total_searches: usize,
    pub avg_results_per_search: f64,
    pub sources: BTreeMap<String, SourceStats>,
}

#[derive(Debug, Clone)]
pub struct SearchLog {
    dir: PathBuf,
}

impl SearchLog {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Persist one search and its results.
    pub fn record(&self, query: &str, source: &str, results: &[SearchHit]) -> Result<PathBuf> {
        let record = SearchRecord {
            query: query.to_string(),
            source: source.to_string(),
            timestamp: Utc::now(),
            results: results.to_vec(),
        };

        fs::create_dir_all(&self.dir)?;
        let path = timestamped_path(&self.dir, RECORD_PREFIX, record.timestamp);
        fs::write(&path, serde_json::to_string_pretty(&record)?)?;
        Ok(path)
    }

    /// All readable records, newest first.
    fn load_all(&self) -> Vec<SearchRecord> {
        let pattern = self.dir.join(format!("{RECORD_PREFIX}*.json"));
        let Ok(paths) = glob::glob(&pattern.to_string_lossy()) else {
            return Vec::new();
        };

        let mut records: Vec<SearchRecord> = paths
            .flatten()
            .filter_map(|path| {
                let parsed = fs::read_to_string(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|json| serde_json::from_str(&json).map_err(|e| e.to_string()));
                match parsed {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable search record");
                        None
                    }
                }
            })
            .collect();

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    /// Most recent searches, optionally restricted to one source.
    pub fn history(&self, source: Option<&str>, limit: usize) -> Vec<SearchRecord> {
        self.load_all()
            .into_iter()
            .filter(|r| source.is_none_or(|s| r.source == s))
            .take(limit)
            .collect()
    }

    /// Aggregate searches from the trailing `days`, optionally for one source.
    pub fn analyze(&self, source: Option<&str>, days: i64) -> SearchMetrics {
        let cutoff = window_start(days);
        let records: Vec<SearchRecord> = self
            .load_all()
            .into_iter()
            .filter(|r| r.timestamp > cutoff)
            .filter(|r| source.is_none_or(|s| r.source == s))
            .collect();

        let mut metrics = SearchMetrics {
            total_searches: records.len(),
            ..Default::default()
        };
        if records.is_empty() {
            return metrics;
        }

        let total_results: usize = records.iter().map(|r| r.results.len()).sum();
        metrics.avg_results_per_search = total_results as f64 / records.len() as f64;

        for record in &records {
            let stats = metrics.sources.entry(record.source.clone()).or_default();
            stats.count += 1;
            stats.total_results += record.results.len();
        }

        metrics
    }
}
