//! Per-session conversation store.
//!
//! Sessions are keyed by an opaque identifier minted by the HTTP layer; the
//! store never inspects it, so it is independent of how sessions are
//! authenticated. Entries are held in memory only and expire after an idle
//! TTL — nothing survives a process restart.
//!
//! Concurrency: the map is guarded by a single mutex. Two concurrent chat
//! requests on the *same* session can still interleave their append order;
//! the UI issues requests serially so this is an accepted race rather than
//! something the store serializes.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::history::{Conversation, Turn};

struct SessionEntry {
    conversation: Conversation,
    last_seen: Instant,
}

/// In-memory map of session id → capped [`Conversation`].
pub struct ConversationStore {
    cap: usize,
    ttl: Duration,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl ConversationStore {
    /// `cap` is the maximum retained turns per session; an odd value is
    /// rounded up so trimming always removes whole User/Assistant pairs.
    pub fn new(cap: usize, ttl: Duration) -> Self {
        let cap = if cap % 2 == 0 { cap } else { cap + 1 };
        Self { cap, ttl, sessions: Mutex::new(HashMap::new()) }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Snapshot of the session's turns, creating an empty conversation on
    /// first access and refreshing its idle timer.
    pub fn history(&self, session_id: &str) -> Vec<Turn> {
        let mut sessions = self.lock();
        let entry = sessions
            .entry(session_id.to_owned())
            .or_insert_with(|| SessionEntry { conversation: Conversation::new(), last_seen: Instant::now() });
        entry.last_seen = Instant::now();
        entry.conversation.turns().to_vec()
    }

    /// Append one User/Assistant exchange, trimming to the retention cap.
    pub fn append_exchange(&self, session_id: &str, user: impl Into<String>, assistant: impl Into<String>) {
        let mut sessions = self.lock();
        let entry = sessions
            .entry(session_id.to_owned())
            .or_insert_with(|| SessionEntry { conversation: Conversation::new(), last_seen: Instant::now() });
        entry.last_seen = Instant::now();
        entry.conversation.push_exchange(user, assistant, self.cap);
    }

    /// Empty the session's history. The session itself survives.
    pub fn clear(&self, session_id: &str) {
        let mut sessions = self.lock();
        if let Some(entry) = sessions.get_mut(session_id) {
            entry.conversation.clear();
            entry.last_seen = Instant::now();
        }
    }

    /// Whether the session has any retained turns. Does not create one.
    pub fn has_context(&self, session_id: &str) -> bool {
        let sessions = self.lock();
        sessions.get(session_id).is_some_and(|e| !e.conversation.is_empty())
    }

    /// Drop sessions idle past the TTL. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, entry| entry.last_seen.elapsed() < ttl);
        before - sessions.len()
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::history::Role;

    fn store() -> ConversationStore {
        ConversationStore::new(20, Duration::from_secs(60))
    }

    #[test]
    fn first_access_creates_empty_conversation() {
        let store = store();
        assert!(store.history("s1").is_empty());
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn has_context_does_not_create_a_session() {
        let store = store();
        assert!(!store.has_context("ghost"));
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn back_to_back_exchanges_accumulate_in_call_order() {
        let store = store();
        store.append_exchange("s1", "q1", "a1");
        store.append_exchange("s1", "q2", "a2");

        let turns = store.history("s1");
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].content, "q1");
        assert_eq!(turns[2].content, "q2");
        assert!(store.has_context("s1"));
    }

    #[test]
    fn sessions_are_isolated() {
        let store = store();
        store.append_exchange("a", "hi", "hello");
        assert!(store.has_context("a"));
        assert!(!store.has_context("b"));
        assert!(store.history("b").is_empty());
    }

    #[test]
    fn clear_empties_but_keeps_the_session() {
        let store = store();
        store.append_exchange("s1", "q", "a");
        store.clear("s1");

        assert!(!store.has_context("s1"));
        assert_eq!(store.session_count(), 1);

        store.append_exchange("s1", "fresh", "start");
        let turns = store.history("s1");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "fresh");
    }

    #[test]
    fn trim_applies_across_many_appends() {
        let store = ConversationStore::new(20, Duration::from_secs(60));
        for i in 0..15 {
            store.append_exchange("s1", format!("q{i}"), format!("a{i}"));
        }

        let turns = store.history("s1");
        assert_eq!(turns.len(), 20);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "q5");
    }

    #[test]
    fn odd_cap_is_rounded_up() {
        let store = ConversationStore::new(5, Duration::from_secs(60));
        assert_eq!(store.cap(), 6);
        for i in 0..5 {
            store.append_exchange("s1", format!("q{i}"), format!("a{i}"));
        }
        let turns = store.history("s1");
        assert_eq!(turns.len(), 6);
        assert_eq!(turns[0].role, Role::User);
    }

    #[test]
    fn sweep_drops_idle_sessions() {
        let store = ConversationStore::new(20, Duration::ZERO);
        store.append_exchange("s1", "q", "a");
        let removed = store.sweep_expired();
        assert_eq!(removed, 1);
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn sweep_keeps_fresh_sessions() {
        let store = ConversationStore::new(20, Duration::from_secs(3600));
        store.append_exchange("s1", "q", "a");
        assert_eq!(store.sweep_expired(), 0);
        assert!(store.has_context("s1"));
    }
}
