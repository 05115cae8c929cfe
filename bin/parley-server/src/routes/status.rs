//! Backend readiness endpoint, polled by the chat page during cold start.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::schemas::status::StatusResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_status), components(schemas(StatusResponse)))]
pub struct StatusApi;

/// Register readiness routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

/// Current backend readiness (`GET /status`).
///
/// Snapshot of the monitor's latest published state; advisory only — chat
/// requests are forwarded regardless.
#[utoipa::path(
    get,
    path = "/status",
    tag = "status",
    responses(
        (status = 200, description = "Current readiness", body = StatusResponse)
    )
)]
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(state.status.snapshot().into())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
