//! File locking utilities for concurrent writers
//!
//! Several agents may share one knowledge base. Record reads and rewrites
//! go through `fs2` advisory locks here and new records appear by rename.
//! Index appends write whole lines under an exclusive lock so concurrent
//! appends never interleave.
//!
//! Advisory locks are cooperative - all participants must use these functions
//! for the locking to be effective.

use crate::error::{KnowledgeError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;

fn lock_err(path: &Path, source: std::io::Error) -> KnowledgeError {
    KnowledgeError::Lock {
        path: path.to_path_buf(),
        source,
    }
}

/// Read file contents with a shared (read) lock.
pub fn locked_read(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    file.lock_shared().map_err(|e| lock_err(path, e))?;
    let mut content = String::new();
    BufReader::new(&file).read_to_string(&mut content)?;
    Ok(content)
}

/// Create `path` with `content`, failing if it already exists.
///
/// The content is staged in a temporary file in the same directory and
/// renamed into place, so a reader never opens a new record before it is
/// fully written.
pub fn write_new_file(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut staging = NamedTempFile::new_in(parent)?;
    staging.write_all(content.as_bytes())?;
    staging.as_file().sync_all()?;
    staging
        .persist_noclobber(path)
        .map_err(|e| KnowledgeError::Io(e.error))?;
    Ok(())
}

/// Append one line to a file under an exclusive lock.
///
/// The file is opened with `O_APPEND` and the line (with its trailing
/// newline) is written in a single `write_all`.
pub fn locked_append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive().map_err(|e| lock_err(path, e))?;
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');
    file.write_all(buf.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// An open file held under an exclusive lock for read-modify-write.
///
/// The lock is released when the guard is dropped.
pub struct LockedFile {
    file: File,
}

impl LockedFile {
    /// Open an existing file and acquire an exclusive lock on it.
    pub fn open_existing(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        file.lock_exclusive().map_err(|e| lock_err(path, e))?;
        Ok(Self { file })
    }

    /// Read the whole file from the start.
    pub fn read_to_string(&mut self) -> Result<String> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut content = String::new();
        self.file.read_to_string(&mut content)?;
        Ok(content)
    }

    /// Replace the file contents while still holding the lock.
    pub fn overwrite(&mut self, content: &str) -> Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(content.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}
