//! Conversation turns and the bounded per-session log.

use serde::{Deserialize, Serialize};

/// Author of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// The label used when rendering a turn into prompt text.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One message exchanged in a conversation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Ordered, capped history of turns for one session.
///
/// Turns are only ever appended in User/Assistant pairs, and the cap is
/// forced even by the caller, so front-trimming never splits a pair.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append one User turn followed by one Assistant turn, then trim the
    /// oldest turns until the length is back within `cap`.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>, cap: usize) {
        self.turns.push(Turn::user(user));
        self.turns.push(Turn::assistant(assistant));
        if self.turns.len() > cap {
            let excess = self.turns.len() - cap;
            self.turns.drain(..excess);
        }
    }

    /// Reset to an empty sequence.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn push_exchange_appends_in_order() {
        let mut conv = Conversation::new();
        conv.push_exchange("hi", "hello", 20);
        conv.push_exchange("how are you", "fine", 20);

        assert_eq!(conv.len(), 4);
        assert_eq!(conv.turns()[0].role, Role::User);
        assert_eq!(conv.turns()[0].content, "hi");
        assert_eq!(conv.turns()[3].role, Role::Assistant);
        assert_eq!(conv.turns()[3].content, "fine");
    }

    #[test]
    fn trim_keeps_cap_and_preserves_pairing() {
        let cap = 6;
        let mut conv = Conversation::new();
        for i in 0..10 {
            conv.push_exchange(format!("q{i}"), format!("a{i}"), cap);
        }

        assert_eq!(conv.len(), cap);
        // Oldest surviving turn is a User turn from the 8th exchange.
        assert_eq!(conv.turns()[0].role, Role::User);
        assert_eq!(conv.turns()[0].content, "q7");
        assert_eq!(conv.turns()[5].content, "a9");
    }

    #[test]
    fn below_cap_nothing_is_trimmed() {
        let mut conv = Conversation::new();
        conv.push_exchange("a", "b", 20);
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut conv = Conversation::new();
        conv.push_exchange("a", "b", 20);
        conv.clear();
        assert!(conv.is_empty());
        conv.push_exchange("c", "d", 20);
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.turns()[0].content, "c");
    }
}
