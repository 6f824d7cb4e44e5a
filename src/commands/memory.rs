//! Print the memory record

use crate::conversation::ConversationStore;
use crate::error::{ConvlogError, Result};
use crate::storage::Storage;

/// Print `memory.json` as pretty JSON (an empty record if none exists yet)
pub fn show_memory<S: Storage>(store: &ConversationStore<S>) -> Result<()> {
    let memory = store.load_memory()?;
    let json = serde_json::to_string_pretty(&memory).map_err(ConvlogError::from)?;
    println!("{}", json);
    Ok(())
}
