//! Storage abstraction for the conversation log
//!
//! The conversation store never touches the file system directly. It reads
//! and writes whole documents through the [`Storage`] trait, addressed by
//! paths relative to a storage root (for example `sessions/abc.json`).
//!
//! Implementations:
//!
//! - [`FsStorage`] -- files under a root directory, atomic temp-file +
//!   rename writes, and an advisory lock file.
//! - [`InMemoryStorage`] -- a map of documents used by tests.

use std::path::{Path, PathBuf};

use crate::error::Result;

mod fs;
mod in_memory;

pub use fs::FsStorage;
pub use in_memory::InMemoryStorage;

/// Document storage used by the conversation store
///
/// All paths are relative to the storage root.
#[cfg_attr(test, mockall::automock)]
pub trait Storage {
    /// Read a whole document as raw bytes.
    ///
    /// Returns `Ok(None)` when the document does not exist. Bytes are not
    /// checked for encoding; decoding is left to the caller.
    ///
    /// # Errors
    ///
    /// Returns `ConvlogError::Io` if the document exists but cannot be read
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>>;

    /// Replace a document with `contents`, creating parent directories as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns `ConvlogError::Io` if the document cannot be written
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// List the documents directly inside `dir`, sorted by path.
    ///
    /// A missing directory yields an empty list.
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Acquire the store-wide write lock.
    ///
    /// The lock is released when the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns `ConvlogError::Lock` if the lock is held elsewhere and does not
    /// become free in time
    fn lock(&self) -> Result<StoreLock>;

    /// Human-readable location of `path`, used in messages.
    fn locate(&self, path: &Path) -> PathBuf;
}

/// Guard for the store-wide write lock
///
/// File-backed guards delete their lock file on drop.
#[derive(Debug)]
pub struct StoreLock {
    path: Option<PathBuf>,
}

impl StoreLock {
    /// A guard that holds nothing, for storage without cross-process locking
    pub fn noop() -> Self {
        Self { path: None }
    }

    fn file(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// Path of the lock file, if this guard owns one
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!("Failed to release lock {}: {}", path.display(), e);
            }
        }
    }
}
