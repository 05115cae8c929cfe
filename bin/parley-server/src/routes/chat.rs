//! The chat endpoint.
//!
//! One inbound message becomes one outbound generate call: the session's
//! history window plus the new message are assembled into a single prompt,
//! the reply is appended to the session as a User/Assistant pair, and the
//! text is returned. Failures never gate on readiness — a request sent
//! before the backend is up simply surfaces the client error.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::OpenApi;

use parley_core::prompt;

use crate::error::ServerError;
use crate::schemas::chat::{ChatRequest, ChatResponse};
use crate::session::ensure_session;
use crate::state::AppState;

/// Maximum accepted message length in bytes, to bound prompt growth.
const MAX_MESSAGE_BYTES: usize = 64 * 1024; // 64 KiB

#[derive(OpenApi)]
#[openapi(paths(chat), components(schemas(ChatRequest, ChatResponse)))]
pub struct ChatApi;

/// Register chat routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}

/// Relay one chat message to the inference backend (`POST /chat`).
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply generated", body = ChatResponse),
        (status = 400, description = "Empty or oversized message"),
        (status = 500, description = "Backend failure"),
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<ChatRequest>,
) -> Result<(CookieJar, Json<ChatResponse>), ServerError> {
    // Cheap precondition checks before any backend round-trip.
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ServerError::BadRequest("message must not be empty".into()));
    }
    if message.len() > MAX_MESSAGE_BYTES {
        return Err(ServerError::BadRequest(format!(
            "message too large ({} bytes); maximum is {MAX_MESSAGE_BYTES} bytes",
            message.len(),
        )));
    }

    let (jar, session_id) = ensure_session(jar);

    let history = state.store.history(&session_id);
    let prompt_text = prompt::assemble(
        state.config.system_prompt(),
        &history,
        state.config.context_window,
        message,
    );
    debug!(
        session = %session_id,
        history_turns = history.len(),
        prompt_len = prompt_text.len(),
        "forwarding chat message"
    );

    let reply = state.client.generate(&prompt_text).await?;

    state.store.append_exchange(&session_id, message, reply.clone());
    info!(session = %session_id, reply_len = reply.len(), "chat turn complete");

    Ok((jar, Json(ChatResponse { response: reply })))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
