//! Session history endpoints: the context indicator and the clear button.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

use crate::schemas::status::{ClearedResponse, HasContextResponse};
use crate::session::ensure_session;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(has_context, clear_history),
    components(schemas(HasContextResponse, ClearedResponse))
)]
pub struct HistoryApi;

/// Register history routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/has-context", get(has_context))
        .route("/clear-history", post(clear_history))
}

/// Whether the caller's session has retained turns (`GET /has-context`).
#[utoipa::path(
    get,
    path = "/has-context",
    tag = "history",
    responses(
        (status = 200, description = "Context presence for this session", body = HasContextResponse)
    )
)]
pub async fn has_context(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<HasContextResponse>) {
    let (jar, session_id) = ensure_session(jar);
    let has_context = state.store.has_context(&session_id);
    (jar, Json(HasContextResponse { has_context }))
}

/// Empty the caller's conversation history (`POST /clear-history`).
///
/// The session itself survives; only its turns are dropped.
#[utoipa::path(
    post,
    path = "/clear-history",
    tag = "history",
    responses(
        (status = 200, description = "History cleared", body = ClearedResponse)
    )
)]
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<ClearedResponse>) {
    let (jar, session_id) = ensure_session(jar);
    state.store.clear(&session_id);
    info!(session = %session_id, "conversation history cleared");
    (jar, Json(ClearedResponse { cleared: true }))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::session::SESSION_COOKIE;
    use axum_extra::extract::cookie::Cookie;
    use parley_core::{BackendClient, ConversationStore, StatusCell};
    use std::time::Duration;

    fn state() -> Arc<AppState> {
        let config = Config::from_env();
        let client = BackendClient::new(
            "http://127.0.0.1:1",
            config.model.clone(),
            config.generation_options(),
            Duration::from_secs(1),
        )
        .expect("client build");
        Arc::new(AppState {
            config: Arc::new(config),
            client: Arc::new(client),
            store: Arc::new(ConversationStore::new(20, Duration::from_secs(60))),
            status: Arc::new(StatusCell::new()),
        })
    }

    fn jar_for(session_id: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(SESSION_COOKIE, session_id.to_owned()))
    }

    #[tokio::test]
    async fn fresh_session_has_no_context() {
        let (_, Json(body)) = has_context(State(state()), jar_for("s1")).await;
        assert!(!body.has_context);
    }

    #[tokio::test]
    async fn context_appears_after_an_exchange() {
        let state = state();
        state.store.append_exchange("s1", "hi", "hello");

        let (_, Json(body)) = has_context(State(state), jar_for("s1")).await;
        assert!(body.has_context);
    }

    #[tokio::test]
    async fn clear_makes_has_context_false() {
        let state = state();
        state.store.append_exchange("s1", "hi", "hello");

        let (_, Json(cleared)) = clear_history(State(Arc::clone(&state)), jar_for("s1")).await;
        assert!(cleared.cleared);

        let (_, Json(body)) = has_context(State(state), jar_for("s1")).await;
        assert!(!body.has_context);
    }

    #[tokio::test]
    async fn clearing_one_session_leaves_others_alone() {
        let state = state();
        state.store.append_exchange("s1", "hi", "hello");
        state.store.append_exchange("s2", "yo", "hey");

        clear_history(State(Arc::clone(&state)), jar_for("s1")).await;

        assert!(!state.store.has_context("s1"));
        assert!(state.store.has_context("s2"));
    }
}
