use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use super::{Storage, StoreLock};
use crate::error::{ConvlogError, Result};

const LOCK_FILE: &str = ".lock";
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// File-system storage rooted at a directory
///
/// Writes go to a hidden sibling temp file which is then renamed over the
/// target, so readers never observe a half-written document.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
    lock_timeout: Duration,
}

impl FsStorage {
    /// Create storage rooted at `root`
    ///
    /// The directory is created lazily on first write.
    ///
    /// # Examples
    ///
    /// ```
    /// use convlog::storage::FsStorage;
    ///
    /// let storage = FsStorage::new("/tmp/convlog-doc");
    /// assert_eq!(storage.root().to_str(), Some("/tmp/convlog-doc"));
    /// ```
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            lock_timeout: Duration::from_millis(5000),
        }
    }

    /// Set how long [`Storage::lock`] waits for a held lock
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// The storage root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    fn ensure_dir(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| ConvlogError::io(dir, e))?;
        Ok(())
    }
}

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        let full = self.resolve(path);
        match fs::read(&full) {
            Ok(contents) => {
                tracing::debug!("Read {} ({} bytes)", full.display(), contents.len());
                Ok(Some(contents))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConvlogError::io(full, e).into()),
        }
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            Self::ensure_dir(parent)?;
        }

        let file_name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ConvlogError::Validation(format!("not a file path: {}", path.display()))
            })?;
        let tmp = full.with_file_name(format!(".{}.tmp", file_name));

        fs::write(&tmp, contents).map_err(|e| ConvlogError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &full) {
            let _ = fs::remove_file(&tmp);
            return Err(ConvlogError::io(full, e).into());
        }

        tracing::debug!("Wrote {} ({} bytes)", full.display(), contents.len());
        Ok(())
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let full = self.resolve(dir);
        let entries = match fs::read_dir(&full) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ConvlogError::io(full, e).into()),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ConvlogError::io(&full, e))?;
            let is_file = entry
                .file_type()
                .map_err(|e| ConvlogError::io(entry.path(), e))?
                .is_file();
            if is_file {
                paths.push(dir.join(entry.file_name()));
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn lock(&self) -> Result<StoreLock> {
        Self::ensure_dir(&self.root)?;
        let path = self.root.join(LOCK_FILE);
        let start = Instant::now();

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(e) = writeln!(file, "{}", std::process::id()) {
                        tracing::debug!("Could not record pid in {}: {}", path.display(), e);
                    }
                    tracing::debug!("Acquired lock {}", path.display());
                    return Ok(StoreLock::file(path));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if start.elapsed() >= self.lock_timeout {
                        return Err(ConvlogError::Lock(format!(
                            "timed out after {} ms waiting for {} (remove it if no other convlog is running)",
                            self.lock_timeout.as_millis(),
                            path.display()
                        ))
                        .into());
                    }
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(e) => return Err(ConvlogError::io(path, e).into()),
            }
        }
    }

    fn locate(&self, path: &Path) -> PathBuf {
        self.resolve(path)
    }
}
