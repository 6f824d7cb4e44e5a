//! Records persisted by the conversation store
//!
//! All records serialize with camelCase field names so that files written by
//! earlier tooling remain readable.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use colored::Colorize;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

use crate::error::ConvlogError;

/// Directory (relative to the storage root) holding one file per session
pub const SESSIONS_DIR: &str = "sessions";

const SESSION_ID_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9._-]*$";
const SESSION_ID_MAX_LEN: usize = 128;

/// Identifier of a conversation session
///
/// Session ids become file names, so they are restricted to ASCII letters,
/// digits, `.`, `_` and `-`, must start with a letter or digit and are at
/// most 128 characters long. Deserialization does not re-validate, so files
/// written by other tools still load.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Validate and wrap a caller-supplied id
    ///
    /// # Errors
    ///
    /// Returns `ConvlogError::Validation` for empty, overlong or unsafe ids
    ///
    /// # Examples
    ///
    /// ```
    /// use convlog::conversation::SessionId;
    ///
    /// assert!(SessionId::new("sample-20251020-0001").is_ok());
    /// assert!(SessionId::new("../etc/passwd").is_err());
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, ConvlogError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ConvlogError::Validation(
                "session id must not be empty".to_string(),
            ));
        }
        if id.len() > SESSION_ID_MAX_LEN {
            return Err(ConvlogError::Validation(format!(
                "session id must be at most {} characters, got {}",
                SESSION_ID_MAX_LEN,
                id.len()
            )));
        }
        let pattern = Regex::new(SESSION_ID_PATTERN)
            .map_err(|e| ConvlogError::Validation(format!("invalid id pattern: {}", e)))?;
        if !pattern.is_match(&id) {
            return Err(ConvlogError::Validation(format!(
                "invalid session id '{}': use letters, digits, '.', '_' or '-'",
                id
            )));
        }
        Ok(Self(id))
    }

    /// Generate a fresh id of the form `session-<ulid>`
    ///
    /// ULIDs start with the current millisecond timestamp followed by 80
    /// random bits, so ids generated back to back do not collide.
    pub fn generate() -> Self {
        Self(format!("session-{}", Ulid::new().to_string().to_lowercase()))
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of this session's file, relative to the storage root
    pub fn file_path(&self) -> PathBuf {
        PathBuf::from(self.filename())
    }

    /// `sessions/<id>.json`, the form recorded in the index
    pub fn filename(&self) -> String {
        format!("{}/{}.json", SESSIONS_DIR, self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = ConvlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation
    #[default]
    User,
    /// The model's replies
    Assistant,
    /// System instructions
    System,
    /// Tool output fed back into the conversation
    Tool,
}

impl Role {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Tool => "tool",
        }
    }

    /// Colored tag for terminal transcripts
    pub fn colored_tag(&self) -> String {
        match self {
            Self::User => format!("[{}]", "user".cyan()),
            Self::Assistant => format!("[{}]", "assistant".green()),
            Self::System => format!("[{}]", "system".purple()),
            Self::Tool => format!("[{}]", "tool".yellow()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ConvlogError;

    /// Parse a role, ignoring case
    ///
    /// # Examples
    ///
    /// ```
    /// use convlog::conversation::Role;
    ///
    /// assert_eq!("Assistant".parse::<Role>().unwrap(), Role::Assistant);
    /// assert!("robot".parse::<Role>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            "tool" => Ok(Self::Tool),
            other => Err(ConvlogError::Validation(format!(
                "unknown role '{}': expected user, assistant, system or tool",
                other
            ))),
        }
    }
}

/// Message text, guaranteed non-blank at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(String);

impl Content {
    /// Wrap message text, rejecting empty or whitespace-only input
    ///
    /// The text is stored as given, without trimming.
    pub fn new(text: impl Into<String>) -> Result<Self, ConvlogError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ConvlogError::Validation(
                "message content must not be empty".to_string(),
            ));
        }
        Ok(Self(text))
    }

    /// The text as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Content {
    type Err = ConvlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A single appended message; never modified afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Content,
    pub timestamp: DateTime<Utc>,
}

/// Owner of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
}

/// One conversation, persisted as `sessions/<id>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: SessionUser,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Session {
    /// Start an empty session created at `now`
    pub fn new(
        session_id: SessionId,
        user_id: impl Into<String>,
        metadata: BTreeMap<String, Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            created_at: now,
            updated_at: now,
            user: SessionUser { id: user_id.into() },
            messages: Vec::new(),
            metadata,
        }
    }

    /// Append a message stamped at `now` and bump `updated_at` to match.
    ///
    /// Message timestamps are strictly increasing: if the clock has not
    /// advanced past the previous message, the new one is stamped one
    /// microsecond later.
    pub fn push(&mut self, role: Role, content: Content, now: DateTime<Utc>) -> &Message {
        let timestamp = match self.messages.last() {
            Some(last) if now <= last.timestamp => last.timestamp + Duration::microseconds(1),
            _ => now,
        };
        self.updated_at = timestamp;
        self.messages.push(Message {
            role,
            content,
            timestamp,
        });
        &self.messages[self.messages.len() - 1]
    }
}

/// One row of the session index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub filename: String,
}

/// Directory of known sessions, persisted as `index.json`
///
/// Entries are kept in insertion order, one per session id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub sessions: Vec<IndexEntry>,
}

/// Rolling record of the latest session and commit, persisted as `memory.json`
///
/// Fields this tool does not know about are kept as-is across updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit_message: Option<String>,
    /// Number of recorded commit checkpoints
    #[serde(default)]
    pub session_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
