use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Accumulated dialogue for one session
#[derive(Debug, Clone)]
struct SessionContext {
    text: String,
    last_updated: Instant,
}

impl SessionContext {
    fn is_expired(&self, expiry: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_updated) > expiry
    }
}

/// Format one question/answer turn the way it is appended to a session context
pub fn format_turn(question: &str, answer: &str) -> String {
    format!("Question: {} Answer: {}\n", question, answer)
}

/// Thread-safe session context store with lazy expiry.
///
/// DashMap shards the key space, so appends on different sessions never
/// contend and an append on one session is a single locked read-modify-write.
pub struct SessionContextStore {
    entries: DashMap<String, SessionContext>,
    expiry: Duration,
}

impl SessionContextStore {
    pub fn new(expiry: Duration) -> Self {
        info!("Initializing session context store (expiry: {:?})", expiry);
        Self {
            entries: DashMap::new(),
            expiry,
        }
    }

    /// Get the accumulated context for a session.
    /// Returns None if not found or expired
    pub fn get(&self, session_id: &str) -> Option<String> {
        self.get_at(session_id, Instant::now())
    }

    pub fn get_at(&self, session_id: &str, now: Instant) -> Option<String> {
        let entry = self.entries.get(session_id)?;

        if entry.is_expired(self.expiry, now) {
            drop(entry); // Release shard read lock
            let expiry = self.expiry;
            self.entries
                .remove_if(session_id, |_, ctx| ctx.is_expired(expiry, now));
            debug!("Session {} expired, removed from store", session_id);
            return None;
        }

        Some(entry.text.clone())
    }

    /// Append a question/answer turn and refresh the last-updated time
    pub fn append(&self, session_id: &str, question: &str, answer: &str) {
        self.append_at(session_id, question, answer, Instant::now());
    }

    pub fn append_at(&self, session_id: &str, question: &str, answer: &str, now: Instant) {
        let mut entry = self
            .entries
            .entry(session_id.to_string())
            .or_insert_with(|| SessionContext {
                text: String::new(),
                last_updated: now,
            });

        // An expired context is superseded, never extended
        if entry.is_expired(self.expiry, now) {
            debug!("Session {} expired before append, starting fresh", session_id);
            entry.text.clear();
        }

        entry.text.push_str(&format_turn(question, answer));
        entry.last_updated = now;

        debug!(
            "Appended turn to session {} (context: {} chars)",
            session_id,
            entry.text.len()
        );
    }

    /// Remove a session's context. No-op if absent
    pub fn clear(&self, session_id: &str) -> bool {
        let removed = self.entries.remove(session_id).is_some();
        debug!("Clear session {} (existed: {})", session_id, removed);
        removed
    }

    /// Reclaim memory held by expired sessions.
    /// Returns number of sessions removed
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    pub fn cleanup_expired_at(&self, now: Instant) -> usize {
        let start_len = self.entries.len();
        let expiry = self.expiry;
        self.entries.retain(|_, ctx| !ctx.is_expired(expiry, now));
        let count = start_len.saturating_sub(self.entries.len());

        if count > 0 {
            info!("Cleaned up {} expired sessions", count);
        }

        count
    }

    /// Number of stored sessions (expired ones included until swept)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
