//! Knowledge base directory layout.

use crate::config::{KnowledgeConfig, CONFIG_FILE};
use crate::error::Result;
use crate::store::categories::{CategorySet, CATEGORIES_FILE};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

const SUBDIRS: &[&str] = &["entries", "indexes", "archive", "index", "search_results"];

/// Paths inside one knowledge base root.
///
/// ```text
/// <root>/
///   config.toml
///   categories.yaml
///   entries/<category>/<id>.json
///   indexes/category_<name>.txt
///   indexes/tag_<name>.txt
///   archive/<id>_v<version>.json
///   index/index_<timestamp>.json
///   search_results/search_<timestamp>.json
/// ```
#[derive(Debug, Clone)]
pub struct KnowledgeDir {
    root: PathBuf,
}

impl KnowledgeDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.join(CATEGORIES_FILE).exists()
    }

    /// Create the directory structure plus default `categories.yaml` and
    /// `config.toml`. Existing files are left untouched.
    pub fn initialize(&self) -> Result<()> {
        self.ensure_structure()?;

        if !self.root.join(CATEGORIES_FILE).exists() {
            CategorySet::defaults().save(&self.root)?;
        }
        if !self.root.join(CONFIG_FILE).exists() {
            KnowledgeConfig::default().save(&self.root)?;
        }

        Ok(())
    }

    /// Create any missing subdirectories.
    pub fn ensure_structure(&self) -> Result<()> {
        for subdir in SUBDIRS {
            fs::create_dir_all(self.root.join(subdir))?;
        }
        Ok(())
    }

    pub fn entries_dir(&self) -> PathBuf {
        self.root.join("entries")
    }

    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.entries_dir().join(category)
    }

    pub fn entry_path(&self, category: &str, id: &str) -> PathBuf {
        self.category_dir(category).join(format!("{id}.json"))
    }

    pub fn indexes_dir(&self) -> PathBuf {
        self.root.join("indexes")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.root.join("archive")
    }

    pub fn archive_path(&self, id: &str, version: u32) -> PathBuf {
        self.archive_dir().join(format!("{id}_v{version}.json"))
    }

    /// Directory holding persisted search snapshots
    pub fn snapshots_dir(&self) -> PathBuf {
        self.root.join("index")
    }

    pub fn search_results_dir(&self) -> PathBuf {
        self.root.join("search_results")
    }
}

/// `<dir>/<prefix><timestamp>.json`, with a numeric suffix when a file from
/// the same microsecond already exists.
pub fn timestamped_path(dir: &Path, prefix: &str, at: DateTime<Utc>) -> PathBuf {
    let stamp = at.format("%Y%m%d_%H%M%S_%6f");
    let path = dir.join(format!("{prefix}{stamp}.json"));
    if !path.exists() {
        return path;
    }
    (1..)
        .map(|n| dir.join(format!("{prefix}{stamp}_{n}.json")))
        .find(|p| !p.exists())
        .unwrap_or(path)
}
