//! convlog - append-only conversation log
//!
//! This library records conversation messages as JSON documents, keeps an
//! index of known sessions, and maintains a small memory record of the most
//! recent session and commit.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `conversation`: Records and the `ConversationStore` that mutates them
//! - `storage`: Storage abstraction with file-system and in-memory backends
//! - `config`: Configuration management and validation
//! - `error`: Error types, result alias and exit codes
//! - `cli`: Command-line interface definition
//! - `commands`: Handlers behind each CLI command
//!
//! # Example
//!
//! ```no_run
//! use convlog::conversation::{Content, ConversationStore, Role, SessionDefaults};
//! use convlog::storage::FsStorage;
//!
//! fn main() -> anyhow::Result<()> {
//!     let storage = FsStorage::new(".conversations");
//!     let store = ConversationStore::new(storage, SessionDefaults::default());
//!     let outcome = store.append_message(None, Role::User, Content::new("hello")?)?;
//!     println!("wrote {}", outcome.location.display());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use conversation::ConversationStore;
pub use error::{ConvlogError, Result};

#[cfg(test)]
pub mod test_utils;
