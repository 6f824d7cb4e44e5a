//! Updates to the rolling memory record

use chrono::{DateTime, Utc};

use super::types::{Memory, SessionId};

impl Memory {
    /// Mark `session_id` as the most recently written session
    pub fn record_session(&mut self, session_id: &SessionId, now: DateTime<Utc>) {
        self.last_session_id = Some(session_id.clone());
        self.updated_at = Some(now);
    }

    /// Record a commit checkpoint.
    ///
    /// `last_commit` and `last_commit_message` are only overwritten when a
    /// non-empty value is supplied. `session_count` goes up by one on every
    /// call, whether or not a new session was written since the last one.
    pub fn record_commit(
        &mut self,
        last_commit: Option<String>,
        message: Option<String>,
        now: DateTime<Utc>,
    ) {
        if let Some(commit) = last_commit.filter(|c| !c.is_empty()) {
            self.last_commit = Some(commit);
        }
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            self.last_commit_message = Some(message);
        }
        self.session_count = self.session_count.saturating_add(1);
        self.updated_at = Some(now);
    }
}
