//! Conversation log store
//!
//! [`ConversationStore`] owns all conversation state on top of an injected
//! [`Storage`]. One append touches three documents, in this order:
//!
//! 1. `sessions/<id>.json` -- the session with the new message
//! 2. `index.json` -- upserted entry for the session
//! 3. `memory.json` -- `lastSessionId` set to the session
//!
//! Every mutating operation holds the storage lock for its whole
//! read-modify-write cycle.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::SessionConfig;
use crate::error::{ConvlogError, Result};
use crate::storage::Storage;

mod index;
mod memory;
pub mod types;

pub use types::{
    Content, Index, IndexEntry, Memory, Message, Role, Session, SessionId, SessionUser,
    SESSIONS_DIR,
};

/// Index file name, relative to the storage root
pub const INDEX_FILE: &str = "index.json";

/// Memory file name, relative to the storage root
pub const MEMORY_FILE: &str = "memory.json";

/// Values stamped onto newly created sessions
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDefaults {
    /// `user.id` of new sessions
    pub user_id: String,
    /// `metadata` of new sessions
    pub metadata: BTreeMap<String, Value>,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for SessionDefaults {
    fn from(config: &SessionConfig) -> Self {
        Self {
            user_id: config.user_id.clone(),
            metadata: config
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        }
    }
}

/// Result of [`ConversationStore::append_message`]
#[derive(Debug, Clone)]
pub struct AppendOutcome {
    /// The session as persisted
    pub session: Session,
    /// Whether this append created the session
    pub created: bool,
    /// Where the session was written
    pub location: PathBuf,
}

/// Result of [`ConversationStore::reindex`]
#[derive(Debug, Clone)]
pub struct ReindexReport {
    /// The index as written
    pub index: Index,
    /// Session files that could not be parsed and were left out
    pub skipped: Vec<PathBuf>,
}

/// Append-only conversation log with a session index and memory record
pub struct ConversationStore<S: Storage> {
    storage: S,
    defaults: SessionDefaults,
}

impl<S: Storage> ConversationStore<S> {
    /// Create a store over `storage`
    ///
    /// # Examples
    ///
    /// ```
    /// use convlog::conversation::{ConversationStore, Content, Role, SessionDefaults, SessionId};
    /// use convlog::storage::InMemoryStorage;
    ///
    /// let store = ConversationStore::new(InMemoryStorage::new(), SessionDefaults::default());
    /// let outcome = store
    ///     .append_message(
    ///         Some(SessionId::new("demo").unwrap()),
    ///         Role::User,
    ///         Content::new("hello").unwrap(),
    ///     )
    ///     .unwrap();
    /// assert!(outcome.created);
    /// assert_eq!(outcome.session.messages.len(), 1);
    /// ```
    pub fn new(storage: S, defaults: SessionDefaults) -> Self {
        Self { storage, defaults }
    }

    /// The underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Append one message to a session, then refresh the index and memory.
    ///
    /// When `session_id` is `None` a new id is generated, so the call always
    /// starts a new session.
    ///
    /// # Errors
    ///
    /// - `ConvlogError::Parse` if an existing session, index or memory file
    ///   is malformed; nothing after the failing file is written
    /// - `ConvlogError::Io` if a file cannot be read or written
    /// - `ConvlogError::Lock` if the store is locked by another writer
    pub fn append_message(
        &self,
        session_id: Option<SessionId>,
        role: Role,
        content: Content,
    ) -> Result<AppendOutcome> {
        let _lock = self.storage.lock()?;
        let session_id = session_id.unwrap_or_else(SessionId::generate);
        let path = session_id.file_path();

        let now = Utc::now();
        let existing = self.read_session(&path)?;
        let created = existing.is_none();
        let mut session = match existing {
            Some(session) => session,
            None => {
                tracing::debug!("Creating session {}", session_id);
                Session::new(
                    session_id.clone(),
                    self.defaults.user_id.clone(),
                    self.defaults.metadata.clone(),
                    now,
                )
            }
        };

        session.push(role, content, now);
        self.write_json(&path, &session)
            .with_context(|| format!("Failed to persist session {}", session_id))?;

        self.upsert_index(&session)
            .context("Session written but index update failed")?;
        self.patch_memory(|memory| memory.record_session(&session_id, Utc::now()))
            .context("Session written but memory update failed")?;

        tracing::info!(
            session_id = %session_id,
            role = %role,
            messages = session.messages.len(),
            created,
            "Appended message"
        );

        Ok(AppendOutcome {
            location: self.storage.locate(&path),
            session,
            created,
        })
    }

    /// Upsert the index entry for `session` and persist the index.
    ///
    /// Repeated calls for the same session never add a second entry.
    pub fn update_index(&self, session: &Session) -> Result<Index> {
        let _lock = self.storage.lock()?;
        self.upsert_index(session)
    }

    /// Set `lastSessionId` in the memory record
    pub fn record_last_session(&self, session_id: &SessionId) -> Result<Memory> {
        let _lock = self.storage.lock()?;
        self.patch_memory(|memory| memory.record_session(session_id, Utc::now()))
    }

    /// Record a commit checkpoint in the memory record.
    ///
    /// Only supplied, non-empty values overwrite `lastCommit` and
    /// `lastCommitMessage`; `sessionCount` is incremented on every call.
    pub fn record_commit(
        &self,
        last_commit: Option<String>,
        message: Option<String>,
    ) -> Result<Memory> {
        let _lock = self.storage.lock()?;
        let memory =
            self.patch_memory(|memory| memory.record_commit(last_commit, message, Utc::now()))?;
        tracing::info!(
            last_commit = memory.last_commit.as_deref().unwrap_or("-"),
            session_count = memory.session_count,
            "Recorded commit"
        );
        Ok(memory)
    }

    /// Rebuild `index.json` from the session files on disk.
    ///
    /// Unparseable session files are skipped and reported.
    pub fn reindex(&self) -> Result<ReindexReport> {
        let _lock = self.storage.lock()?;
        let mut sessions = Vec::new();
        let mut skipped = Vec::new();

        for path in self.storage.list(Path::new(SESSIONS_DIR))? {
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_session(&path) {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(e) if is_parse_error(&e) => {
                    tracing::warn!("Skipping unreadable session file: {:#}", e);
                    skipped.push(path);
                }
                Err(e) => return Err(e),
            }
        }

        let index = Index::rebuild(&sessions, Utc::now());
        self.write_json(Path::new(INDEX_FILE), &index)?;
        tracing::info!(
            sessions = index.sessions.len(),
            skipped = skipped.len(),
            "Rebuilt index"
        );
        Ok(ReindexReport { index, skipped })
    }

    /// Load a session by id
    pub fn load_session(&self, session_id: &SessionId) -> Result<Option<Session>> {
        self.read_session(&session_id.file_path())
    }

    /// Load the index, or an empty one if none has been written yet
    pub fn load_index(&self) -> Result<Index> {
        Ok(self
            .read_json(Path::new(INDEX_FILE))?
            .unwrap_or_else(|| Index::empty(Utc::now())))
    }

    /// Load the memory record, or an empty one if none has been written yet
    pub fn load_memory(&self) -> Result<Memory> {
        Ok(self.read_json(Path::new(MEMORY_FILE))?.unwrap_or_default())
    }

    /// Index entries in index order
    pub fn list_sessions(&self) -> Result<Vec<IndexEntry>> {
        Ok(self.load_index()?.sessions)
    }

    /// Location of a document, for messages
    pub fn locate(&self, path: &Path) -> PathBuf {
        self.storage.locate(path)
    }

    fn upsert_index(&self, session: &Session) -> Result<Index> {
        let path = Path::new(INDEX_FILE);
        let now = Utc::now();
        let mut index = self
            .read_json::<Index>(path)?
            .unwrap_or_else(|| Index::empty(now));
        if index.upsert(session, now) {
            tracing::debug!("Added {} to index", session.session_id);
        }
        self.write_json(path, &index)?;
        Ok(index)
    }

    fn patch_memory<F>(&self, apply: F) -> Result<Memory>
    where
        F: FnOnce(&mut Memory),
    {
        let path = Path::new(MEMORY_FILE);
        let mut memory = self.read_json::<Memory>(path)?.unwrap_or_default();
        apply(&mut memory);
        self.write_json(path, &memory)?;
        Ok(memory)
    }

    /// Read a session file, rejecting one whose `sessionId` does not name it.
    ///
    /// The index derives file names from ids, so a mismatched or unsafe id
    /// makes the file unusable and is reported as a parse error.
    fn read_session(&self, path: &Path) -> Result<Option<Session>> {
        let session: Session = match self.read_json(path)? {
            Some(session) => session,
            None => return Ok(None),
        };
        let id = session.session_id.as_str();
        let named_by_id = path.file_stem().and_then(|s| s.to_str()) == Some(id)
            && SessionId::new(id).is_ok();
        if !named_by_id {
            let reason = format!(
                "sessionId '{}' does not match file name {}",
                id,
                path.display()
            );
            return Err(ConvlogError::parse(
                self.storage.locate(path),
                <serde_json::Error as serde::de::Error>::custom(reason),
            )
            .into());
        }
        Ok(Some(session))
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match self.storage.read(path)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| ConvlogError::parse(self.storage.locate(path), e).into()),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let contents = serde_json::to_string_pretty(value).map_err(ConvlogError::from)?;
        self.storage.write(path, &contents)
    }
}

fn is_parse_error(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ConvlogError>(),
        Some(ConvlogError::Parse { .. })
    )
}
