/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `append`        — Append a message to a session
- `update_memory` — Record a commit checkpoint
- `history`       — List, show and reindex sessions
- `memory`        — Print the memory record

Handlers print their confirmation to stdout; logs go to stderr.
*/

use crate::config::Config;
use crate::conversation::{ConversationStore, SessionDefaults};
use crate::storage::FsStorage;

pub mod append;
pub mod history;
pub mod memory;
pub mod update_memory;

/// Open the file-backed store described by `config`
pub fn open_store(config: &Config) -> ConversationStore<FsStorage> {
    let storage = FsStorage::new(config.storage.root.clone())
        .with_lock_timeout(config.storage.lock_timeout());
    tracing::debug!("Using storage root {}", storage.root().display());
    ConversationStore::new(storage, SessionDefaults::from(&config.session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Content, Role, SessionId};
    use tempfile::tempdir;

    #[test]
    fn test_open_store_uses_configured_root_and_defaults() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.root = dir.path().join("logs");
        config.session.user_id = "cfg-user".to_string();

        let store = open_store(&config);
        assert_eq!(store.storage().root(), dir.path().join("logs"));

        let outcome = store
            .append_message(
                Some(SessionId::new("s1").unwrap()),
                Role::User,
                Content::new("hi").unwrap(),
            )
            .unwrap();
        assert_eq!(outcome.session.user.id, "cfg-user");
        assert!(dir.path().join("logs/sessions/s1.json").exists());
    }
}
