//! Append a message to a session

use colored::Colorize;

use crate::conversation::{AppendOutcome, Content, ConversationStore, Role, SessionId};
use crate::error::Result;
use crate::storage::Storage;

/// Append a message and print where it was written
///
/// # Arguments
///
/// * `store` - Conversation store
/// * `session_id` - Target session; `None` starts a new session
/// * `role` - Message author
/// * `content` - Message text
pub fn run_append<S: Storage>(
    store: &ConversationStore<S>,
    session_id: Option<SessionId>,
    role: Role,
    content: Content,
) -> Result<AppendOutcome> {
    let outcome = store.append_message(session_id, role, content)?;

    println!("Appended message to {}", outcome.location.display());
    if outcome.created {
        println!(
            "{}",
            format!("Started session {}", outcome.session.session_id).green()
        );
    }

    Ok(outcome)
}
