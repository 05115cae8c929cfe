//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use parley_core::{BackendClient, ConversationStore, StatusCell};

use crate::config::Config;

/// State shared across all HTTP handlers and the monitor task.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Outbound client for the inference daemon.
    pub client: Arc<BackendClient>,
    /// Per-session conversation histories.
    pub store: Arc<ConversationStore>,
    /// Readiness published by the monitor, read by `GET /status`.
    pub status: Arc<StatusCell>,
}
