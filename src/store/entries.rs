//! Entry store: one JSON record per entry under `entries/<category>/`.

use super::categories::{CategoryInfo, CategorySet};
use super::ids::generate_id;
use super::index::{IndexKey, IndexManager};
use super::types::{
    clamp_confidence, render_metadata, EntryQuery, EntryUpdate, KnowledgeEntry, NewEntry,
};
use crate::config::ReadPolicy;
use crate::error::{KnowledgeError, Result};
use crate::fs::layout::KnowledgeDir;
use crate::fs::locking::{locked_read, write_new_file, LockedFile};
use crate::validation::validate_name;
use chrono::Utc;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Attempts at finding an unused id before giving up
const MAX_ID_ATTEMPTS: u32 = 8;

#[derive(Debug, Clone)]
pub struct EntryStore {
    dir: KnowledgeDir,
    categories: CategorySet,
    index: IndexManager,
    read_policy: ReadPolicy,
}

impl EntryStore {
    /// Open a store over an initialized knowledge base, loading
    /// `categories.yaml` and creating any missing subdirectories.
    pub fn open(dir: KnowledgeDir, read_policy: ReadPolicy) -> Result<Self> {
        let categories = CategorySet::load(dir.root())?;
        dir.ensure_structure()?;
        Ok(Self::with_categories(dir, categories, read_policy))
    }

    pub fn with_categories(
        dir: KnowledgeDir,
        categories: CategorySet,
        read_policy: ReadPolicy,
    ) -> Self {
        let index = IndexManager::new(dir.indexes_dir());
        Self {
            dir,
            categories,
            index,
            read_policy,
        }
    }

    pub fn dir(&self) -> &KnowledgeDir {
        &self.dir
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn category_info(&self, category: &str) -> Option<&CategoryInfo> {
        self.categories.get(category)
    }

    pub fn index(&self) -> &IndexManager {
        &self.index
    }

    fn check_category(&self, category: &str) -> Result<()> {
        if !self.categories.contains(category) {
            return Err(KnowledgeError::InvalidCategory(category.to_string()));
        }
        validate_name(category)
    }

    /// Add a new entry and return its generated id.
    pub fn add(&self, new: NewEntry) -> Result<String> {
        self.check_category(&new.category)?;

        let now = Utc::now();
        let id = self.unused_id(&new.content, &new.category, now)?;
        let entry = KnowledgeEntry {
            id: id.clone(),
            content: new.content,
            category: new.category,
            tags: new.tags,
            source: new.source,
            created_at: now,
            updated_at: now,
            version: 1,
            confidence: clamp_confidence(new.confidence),
            references: new.references,
            metadata: new.metadata,
        };

        self.write_new(&entry)?;
        info!(id = %entry.id, category = %entry.category, "Added knowledge entry");
        Ok(id)
    }

    fn unused_id(&self, content: &str, category: &str, now: chrono::DateTime<Utc>) -> Result<String> {
        for nonce in 0..MAX_ID_ATTEMPTS {
            let id = generate_id(content, category, now, nonce);
            if self.locate(&id)?.is_none() {
                return Ok(id);
            }
            warn!(id = %id, nonce, "Generated id already in use, retrying");
        }
        Err(KnowledgeError::IdExhausted(MAX_ID_ATTEMPTS))
    }

    fn write_new(&self, entry: &KnowledgeEntry) -> Result<()> {
        fs::create_dir_all(self.dir.category_dir(&entry.category))?;
        let path = self.dir.entry_path(&entry.category, &entry.id);
        write_new_file(&path, &serde_json::to_string_pretty(entry)?)?;

        self.index
            .append(&IndexKey::category(entry.category.as_str()), &entry.id)?;
        for tag in &entry.tags {
            self.index.append(&IndexKey::tag(tag.as_str()), &entry.id)?;
        }
        Ok(())
    }

    /// Read one entry. A missing record is `Ok(None)`.
    pub fn get(&self, category: &str, id: &str) -> Result<Option<KnowledgeEntry>> {
        validate_name(category)?;
        validate_name(id)?;
        self.read_record(&self.dir.entry_path(category, id))
    }

    /// Find an entry by id in any category.
    pub fn find(&self, id: &str) -> Result<Option<KnowledgeEntry>> {
        match self.locate(id)? {
            Some(path) => self.read_record(&path),
            None => Ok(None),
        }
    }

    /// Path of the record for `id`, searching category directories in
    /// name order.
    fn locate(&self, id: &str) -> Result<Option<PathBuf>> {
        validate_name(id)?;
        for category in self.category_dirs()? {
            let path = self.dir.entry_path(&category, id);
            if path.exists() {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    /// Category directories present on disk, sorted by name.
    fn category_dirs(&self) -> Result<Vec<String>> {
        let entries_dir = self.dir.entries_dir();
        if !entries_dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&entries_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_record(&self, path: &Path) -> Result<Option<KnowledgeEntry>> {
        let raw = match locked_read(path) {
            Ok(raw) => raw,
            Err(KnowledgeError::Io(e)) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        self.parse_record(path, &raw)
    }

    fn parse_record(&self, path: &Path, raw: &str) -> Result<Option<KnowledgeEntry>> {
        match serde_json::from_str(raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(source) => match self.read_policy {
                ReadPolicy::Degrade => {
                    warn!(path = %path.display(), error = %source, "Ignoring malformed record");
                    Ok(None)
                }
                ReadPolicy::Strict => Err(KnowledgeError::MalformedRecord {
                    path: path.to_path_buf(),
                    source,
                }),
            },
        }
    }

    /// Apply a partial update, archiving the current version first.
    ///
    /// Returns `Ok(None)` when no entry has this id.
    pub fn update(&self, id: &str, update: EntryUpdate) -> Result<Option<KnowledgeEntry>> {
        let Some(path) = self.locate(id)? else {
            return Ok(None);
        };

        let mut locked = match LockedFile::open_existing(&path) {
            Ok(locked) => locked,
            Err(KnowledgeError::Io(e)) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let raw = locked.read_to_string()?;
        let Some(mut entry) = self.parse_record(&path, &raw)? else {
            return Ok(None);
        };

        self.archive(&entry, &raw)?;

        let rerender = entry.is_document() && update.content.is_none();
        let added_tags = update.apply(&mut entry);
        if rerender {
            entry.content = render_metadata(&entry.metadata)?;
        }
        entry.version += 1;
        entry.updated_at = Utc::now();
        locked.overwrite(&serde_json::to_string_pretty(&entry)?)?;
        drop(locked);

        for tag in &added_tags {
            self.index.append(&IndexKey::tag(tag.as_str()), &entry.id)?;
        }

        info!(id = %entry.id, version = entry.version, "Updated knowledge entry");
        Ok(Some(entry))
    }

    /// Create or overwrite an entry under a caller-chosen id.
    ///
    /// An existing entry is archived and all mutable fields are replaced;
    /// `created_at` is kept and the version is bumped.
    pub fn replace(&self, category: &str, id: &str, new: NewEntry) -> Result<KnowledgeEntry> {
        validate_name(category)?;
        validate_name(id)?;
        let path = self.dir.entry_path(category, id);

        if !path.exists() {
            self.check_category(category)?;
            let now = Utc::now();
            let entry = KnowledgeEntry {
                id: id.to_string(),
                content: new.content,
                category: category.to_string(),
                tags: new.tags,
                source: new.source,
                created_at: now,
                updated_at: now,
                version: 1,
                confidence: clamp_confidence(new.confidence),
                references: new.references,
                metadata: new.metadata,
            };
            self.write_new(&entry)?;
            info!(id = %id, category = %category, "Stored knowledge document");
            return Ok(entry);
        }

        let mut locked = LockedFile::open_existing(&path)?;
        let raw = locked.read_to_string()?;
        let mut entry: KnowledgeEntry =
            serde_json::from_str(&raw).map_err(|source| KnowledgeError::MalformedRecord {
                path: path.clone(),
                source,
            })?;

        self.archive(&entry, &raw)?;

        let added_tags: Vec<String> = new
            .tags
            .iter()
            .filter(|t| !entry.has_tag(t))
            .cloned()
            .collect();
        entry.content = new.content;
        entry.tags = new.tags;
        entry.source = new.source;
        entry.confidence = clamp_confidence(new.confidence);
        entry.references = new.references;
        entry.metadata = new.metadata;
        entry.version += 1;
        entry.updated_at = Utc::now();
        locked.overwrite(&serde_json::to_string_pretty(&entry)?)?;
        drop(locked);

        for tag in &added_tags {
            self.index.append(&IndexKey::tag(tag.as_str()), &entry.id)?;
        }

        info!(id = %id, version = entry.version, "Replaced knowledge document");
        Ok(entry)
    }

    /// Write the raw pre-update record to `archive/<id>_v<version>.json`.
    fn archive(&self, entry: &KnowledgeEntry, raw: &str) -> Result<()> {
        fs::create_dir_all(self.dir.archive_dir())?;
        fs::write(self.dir.archive_path(&entry.id, entry.version), raw)?;
        Ok(())
    }

    /// Read an archived version of an entry.
    pub fn archived(&self, id: &str, version: u32) -> Result<Option<KnowledgeEntry>> {
        validate_name(id)?;
        self.read_record(&self.dir.archive_path(id, version))
    }

    /// Ids of the records stored in a category directory, sorted.
    ///
    /// Unknown categories and missing directories yield an empty list.
    pub fn list(&self, category: &str) -> Result<Vec<String>> {
        validate_name(category)?;
        let dir = self.dir.category_dir(category);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Linear scan over every stored entry, in category then id order.
    pub fn query(&self, query: &EntryQuery) -> Result<Vec<KnowledgeEntry>> {
        let mut results = Vec::new();
        if query.limit == 0 {
            return Ok(results);
        }

        let categories = match &query.category {
            Some(category) => vec![category.clone()],
            None => self.category_dirs()?,
        };

        for category in categories {
            for id in self.list(&category)? {
                let Some(entry) = self.get(&category, &id)? else {
                    continue;
                };
                if query.matches(&entry) {
                    results.push(entry);
                    if results.len() >= query.limit {
                        return Ok(results);
                    }
                }
            }
        }

        Ok(results)
    }

    /// Entries listed in a category index. Unknown categories yield an empty
    /// list.
    pub fn category_entries(&self, category: &str) -> Result<Vec<KnowledgeEntry>> {
        if !self.categories.contains(category) {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for id in self.index.read(&IndexKey::category(category))? {
            if let Some(entry) = self.get(category, &id)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Entries listed in a tag index that still carry the tag.
    pub fn tag_entries(&self, tag: &str) -> Result<Vec<KnowledgeEntry>> {
        let mut entries = Vec::new();
        for id in self.index.read(&IndexKey::tag(tag))? {
            if let Some(entry) = self.find(&id)? {
                if entry.has_tag(tag) {
                    entries.push(entry);
                }
            }
        }
        Ok(entries)
    }
}
