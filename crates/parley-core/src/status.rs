//! Process-wide readiness status.
//!
//! A single [`StatusCell`] is shared between the monitor task (the only
//! writer) and every request handler (readers). Writes replace the whole
//! value under the lock, so a reader always observes a complete
//! state/message pair, never a partial update.

use std::sync::{PoisonError, RwLock};

use serde::Serialize;

/// Tri-state readiness of the inference backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessState {
    Loading,
    Ready,
    Error,
}

/// Latest readiness state plus a human-readable message for the UI.
/// No history is retained.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessStatus {
    pub state: ReadinessState,
    pub message: String,
}

impl ReadinessStatus {
    pub fn loading(message: impl Into<String>) -> Self {
        Self { state: ReadinessState::Loading, message: message.into() }
    }

    pub fn ready(message: impl Into<String>) -> Self {
        Self { state: ReadinessState::Ready, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { state: ReadinessState::Error, message: message.into() }
    }
}

/// Atomically swappable holder for the current [`ReadinessStatus`].
pub struct StatusCell {
    inner: RwLock<ReadinessStatus>,
}

impl StatusCell {
    /// Starts in `loading` with the initial startup message.
    pub fn new() -> Self {
        Self { inner: RwLock::new(ReadinessStatus::loading("starting backend")) }
    }

    /// Replace the published status wholesale.
    pub fn publish(&self, status: ReadinessStatus) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = status;
    }

    /// Clone of the current status.
    pub fn snapshot(&self) -> ReadinessStatus {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn state(&self) -> ReadinessState {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).state
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn starts_loading() {
        let cell = StatusCell::new();
        let status = cell.snapshot();
        assert_eq!(status.state, ReadinessState::Loading);
        assert_eq!(status.message, "starting backend");
    }

    #[test]
    fn publish_replaces_the_whole_value() {
        let cell = StatusCell::new();
        cell.publish(ReadinessStatus::ready("backend is ready"));

        let status = cell.snapshot();
        assert_eq!(status.state, ReadinessState::Ready);
        assert_eq!(status.message, "backend is ready");
    }

    #[test]
    fn state_serializes_lowercase() {
        let json = serde_json::to_string(&ReadinessStatus::error("boom")).unwrap();
        assert_eq!(json, r#"{"state":"error","message":"boom"}"#);
    }
}
