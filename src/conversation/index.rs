//! Session index maintenance

use chrono::{DateTime, Utc};

use super::types::{Index, IndexEntry, Session, SessionId};

impl Index {
    /// An index with no sessions, generated at `now`
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            generated_at: now,
            sessions: Vec::new(),
        }
    }

    /// Look up the entry for `session_id`
    pub fn get(&self, session_id: &SessionId) -> Option<&IndexEntry> {
        self.sessions.iter().find(|e| &e.session_id == session_id)
    }

    /// Record `session` in the index.
    ///
    /// A known session only has its `updated_at` refreshed in place; an
    /// unknown one is appended at the end. `generated_at` is always reset to
    /// `now`. Returns `true` when a new entry was added.
    pub fn upsert(&mut self, session: &Session, now: DateTime<Utc>) -> bool {
        self.generated_at = now;
        match self
            .sessions
            .iter_mut()
            .find(|e| e.session_id == session.session_id)
        {
            Some(existing) => {
                existing.updated_at = session.updated_at;
                false
            }
            None => {
                self.sessions.push(IndexEntry::for_session(session));
                true
            }
        }
    }

    /// Build a fresh index from parsed sessions, ordered by creation time
    /// (ties broken by id). Duplicate ids keep the most recently updated copy.
    pub fn rebuild(sessions: &[Session], now: DateTime<Utc>) -> Self {
        let mut entries: Vec<IndexEntry> = Vec::with_capacity(sessions.len());
        for session in sessions {
            match entries
                .iter_mut()
                .find(|e| e.session_id == session.session_id)
            {
                Some(existing) if existing.updated_at < session.updated_at => {
                    *existing = IndexEntry::for_session(session);
                }
                Some(_) => {}
                None => entries.push(IndexEntry::for_session(session)),
            }
        }
        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Self {
            generated_at: now,
            sessions: entries,
        }
    }
}

impl IndexEntry {
    /// Entry describing `session`
    pub fn for_session(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            created_at: session.created_at,
            updated_at: session.updated_at,
            filename: session.session_id.filename(),
        }
    }
}
