//! Versioned knowledge entry storage.
//!
//! Entries live one per file under `entries/<category>/<id>.json`. Updates
//! archive the previous version under `archive/` before overwriting, and
//! every add appends to the category and tag indexes under `indexes/`.

pub mod categories;
pub mod entries;
pub mod ids;
pub mod index;
pub mod types;

pub use categories::{CategoryInfo, CategorySet};
pub use entries::EntryStore;
pub use index::{IndexKey, IndexManager};
pub use types::{
    clamp_confidence, render_metadata, EntryQuery, EntryUpdate, KnowledgeEntry, NewEntry,
};
