//! Directory-tree cache store.
//!
//! [`CacheStore`] owns the cache root. Entries live at
//! `{root}/{key}/{filename}` and hold exactly one rendered file.
//!
//! Writes go through [`StagedOutput`]: the converter writes into a private
//! staging directory next to the entry, and the finished file is renamed
//! into place. A converter killed mid-write leaves only the staging
//! directory behind (removed on drop), never a truncated entry that would
//! later pass the staleness check.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::CacheKey;

/// Prefix of staging directories inside an entry directory.
const STAGING_PREFIX: &str = ".staging-";

/// File-based cache rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `root`. Nothing is created on disk until
    /// the first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of `filename` inside the entry for `key`.
    ///
    /// Pure path computation, no filesystem access.
    #[must_use]
    pub fn resolve_path(&self, key: &CacheKey, filename: &str) -> PathBuf {
        self.root.join(key.as_str()).join(filename)
    }

    /// Create `dir` and all missing parents.
    ///
    /// Succeeds if the directory already exists, including when another
    /// build creates it concurrently.
    pub fn ensure_directory(dir: &Path) -> io::Result<()> {
        match fs::create_dir_all(dir) {
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
            other => other,
        }
    }

    /// Prepare a staged write for the final entry path `target`.
    ///
    /// Creates the entry directory and a fresh staging directory inside it.
    /// The returned [`StagedOutput::path`] has the same file name as
    /// `target` and does not exist yet.
    pub fn stage(&self, target: &Path) -> io::Result<StagedOutput> {
        let (Some(parent), Some(filename)) = (target.parent(), target.file_name()) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid cache entry path: {}", target.display()),
            ));
        };
        Self::ensure_directory(parent)?;

        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)?;
        let path = dir.path().join(filename);
        Ok(StagedOutput {
            dir,
            path,
            target: target.to_path_buf(),
        })
    }
}

/// A pending write into a cache entry.
///
/// Dropping it without calling [`commit`](Self::commit) discards whatever
/// was written to the staging path.
#[derive(Debug)]
pub struct StagedOutput {
    dir: TempDir,
    path: PathBuf,
    target: PathBuf,
}

impl StagedOutput {
    /// Path the producer should write to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final entry path.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Move the staged file into the entry, replacing any previous version.
    ///
    /// The rename keeps the modification time the producer gave the file.
    /// With two concurrent writers for the same entry the last rename wins.
    pub fn commit(self) -> io::Result<PathBuf> {
        fs::rename(&self.path, &self.target)?;
        tracing::debug!("committed cache entry {}", self.target.display());
        drop(self.dir);
        Ok(self.target)
    }
}
