//! Append-only category and tag indexes.
//!
//! Each index is a newline-delimited list of entry ids. Writes only ever
//! append; an id appended twice appears twice on disk and is folded on read.

use crate::error::Result;
use crate::fs::locking::{locked_append_line, locked_read};
use crate::validation::sanitize_tag;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKey {
    Category(String),
    Tag(String),
}

impl IndexKey {
    pub fn category(name: impl Into<String>) -> Self {
        IndexKey::Category(name.into())
    }

    pub fn tag(name: impl Into<String>) -> Self {
        IndexKey::Tag(name.into())
    }

    /// File name of this index inside `indexes/`
    pub fn filename(&self) -> String {
        match self {
            IndexKey::Category(name) => format!("category_{name}.txt"),
            IndexKey::Tag(name) => format!("tag_{}.txt", sanitize_tag(name)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexManager {
    dir: PathBuf,
}

impl IndexManager {
    pub fn new<P: AsRef<Path>>(indexes_dir: P) -> Self {
        Self {
            dir: indexes_dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, key: &IndexKey) -> PathBuf {
        self.dir.join(key.filename())
    }

    /// Append one id to an index, creating the file if needed.
    pub fn append(&self, key: &IndexKey, id: &str) -> Result<()> {
        debug!(index = %key.filename(), id = %id, "Appending to index");
        locked_append_line(&self.path(key), id)
    }

    /// Read an index, dropping blank lines and repeated ids.
    pub fn read(&self, key: &IndexKey) -> Result<Vec<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = locked_read(&path)?;
        let mut seen = HashSet::new();
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| seen.insert(*line))
            .map(str::to_string)
            .collect())
    }
}
