//! Record a commit checkpoint in the memory file

use colored::Colorize;

use crate::conversation::{ConversationStore, Memory};
use crate::error::Result;
use crate::storage::Storage;

/// Update `lastCommit` / `lastCommitMessage` and bump the checkpoint count
///
/// Intended to be called from a post-commit hook, for example:
///
/// ```text
/// convlog update-memory --lastCommit "$(git rev-parse HEAD)" --message "$(git log -1 --format=%s)"
/// ```
pub fn run_update_memory<S: Storage>(
    store: &ConversationStore<S>,
    last_commit: Option<String>,
    message: Option<String>,
) -> Result<Memory> {
    let memory = store.record_commit(last_commit, message)?;

    println!(
        "{} (checkpoint {})",
        "Memory updated".green(),
        memory.session_count
    );

    Ok(memory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::SessionDefaults;
    use crate::storage::InMemoryStorage;

    #[test]
    fn test_run_update_memory_persists_commit() {
        let store = ConversationStore::new(InMemoryStorage::new(), SessionDefaults::default());
        run_update_memory(&store, Some("abc123".into()), Some("fix bug".into())).unwrap();
        let memory = run_update_memory(&store, None, None).unwrap();

        assert_eq!(memory.last_commit.as_deref(), Some("abc123"));
        assert_eq!(memory.last_commit_message.as_deref(), Some("fix bug"));
        assert_eq!(memory.session_count, 2);
        assert_eq!(store.load_memory().unwrap(), memory);
    }
}
