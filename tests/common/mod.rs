use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use convlog::conversation::{ConversationStore, SessionDefaults};
use convlog::storage::FsStorage;

#[allow(dead_code)]
pub fn create_temp_store() -> (ConversationStore<FsStorage>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let storage = FsStorage::new(tmp.path().join(".conversations"));
    (ConversationStore::new(storage, SessionDefaults::default()), tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("convlog.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn read_json(path: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
    serde_json::from_str(&raw).expect("file is not valid JSON")
}
