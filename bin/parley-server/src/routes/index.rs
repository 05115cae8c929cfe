//! The chat page.
//!
//! A single embedded HTML document; the only server-side templating is the
//! model-name substitution. Visiting the page also makes sure the session
//! cookie exists so the first chat call lands in an established session.

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::session::ensure_session;
use crate::state::AppState;

const PAGE: &str = include_str!("../../assets/index.html");

/// Register the chat-page route.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(index))
}

pub async fn index(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Html<String>) {
    let (jar, _session_id) = ensure_session(jar);
    (jar, Html(PAGE.replace("{{model}}", &state.config.model)))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn page_has_a_model_placeholder() {
        assert!(PAGE.contains("{{model}}"));
        assert!(PAGE.contains("/status"));
        assert!(PAGE.contains("/chat"));
    }
}
