use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{Storage, StoreLock};
use crate::error::Result;

/// In-process document storage
///
/// Holds documents in a map keyed by relative path. Used as a fake in
/// tests; locking is a no-op.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use convlog::storage::{InMemoryStorage, Storage};
///
/// let storage = InMemoryStorage::new();
/// storage.write(Path::new("index.json"), "{}").unwrap();
/// assert_eq!(storage.get("index.json").as_deref(), Some("{}"));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

impl InMemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document directly, bypassing the store
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files_guard().insert(path.into(), contents.into());
    }

    /// Fetch a document's contents as text (invalid UTF-8 is replaced)
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files_guard()
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// All stored paths, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files_guard().keys().cloned().collect()
    }

    fn files_guard(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Vec<u8>>> {
        // Map operations are single calls; a poisoned map is never half-updated.
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Storage for InMemoryStorage {
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        Ok(self.files_guard().get(path).cloned())
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.insert(path, contents);
        Ok(())
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .files_guard()
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn lock(&self) -> Result<StoreLock> {
        Ok(StoreLock::noop())
    }

    fn locate(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_returns_none() {
        let storage = InMemoryStorage::new();
        assert!(storage.read(Path::new("memory.json")).unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let storage = InMemoryStorage::new();
        storage.write(Path::new("memory.json"), "{}").unwrap();
        assert_eq!(
            storage.read(Path::new("memory.json")).unwrap().as_deref(),
            Some(&b"{}"[..])
        );
    }

    #[test]
    fn test_binary_contents_round_trip_unchanged() {
        let storage = InMemoryStorage::new();
        storage.insert("sessions/bin.json", vec![0xff, 0xfe, 0x00]);
        assert_eq!(
            storage.read(Path::new("sessions/bin.json")).unwrap(),
            Some(vec![0xff, 0xfe, 0x00])
        );
    }

    #[test]
    fn test_list_only_direct_children() {
        let storage = InMemoryStorage::new();
        storage.insert("sessions/b.json", "{}");
        storage.insert("sessions/a.json", "{}");
        storage.insert("index.json", "{}");

        let listed = storage.list(Path::new("sessions")).unwrap();
        assert_eq!(
            listed,
            vec![
                PathBuf::from("sessions/a.json"),
                PathBuf::from("sessions/b.json")
            ]
        );
    }

    #[test]
    fn test_lock_is_noop() {
        let storage = InMemoryStorage::new();
        let first = storage.lock().unwrap();
        let second = storage.lock().unwrap();
        assert!(first.path().is_none());
        assert!(second.path().is_none());
    }
}
