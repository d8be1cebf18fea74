//! Full-text search over periodically rebuilt snapshots.

pub mod engine;
pub mod history;
pub mod scoring;
pub mod snapshot;

pub use engine::{
    window_start, RecentUpdate, SearchEngine, SearchHit, DEFAULT_RECENT_DAYS,
    DEFAULT_RELATED_LIMIT, DEFAULT_SEARCH_LIMIT,
};
pub use history::{SearchLog, SearchMetrics, SearchRecord, SourceStats};
pub use snapshot::{snapshot_key, Snapshot, SnapshotEntry};
