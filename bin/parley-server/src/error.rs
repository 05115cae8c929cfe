//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.
//!
//! **Security note:** backend and internal failures are logged with full
//! detail but only a fixed message is returned to the caller, so transport
//! errors or daemon output never leak to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parley_core::ClientError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// All errors that can occur in the parley-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the backend client.
    #[error("backend error: {0}")]
    Backend(#[from] ClientError),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),

            // Backend failures: one fixed message per class, detail logged.
            ServerError::Backend(e) => {
                error!(error = %e, "backend call failed");
                let message = match e {
                    ClientError::Timeout => {
                        "The request to the model timed out. Try again.".to_owned()
                    }
                    ClientError::Unreachable(_) => {
                        "Could not contact the model backend. Wait for it to initialize."
                            .to_owned()
                    }
                    ClientError::Status { .. } => {
                        "The model backend returned an error. Try again later.".to_owned()
                    }
                    ClientError::Api(_)
                    | ClientError::MalformedReply
                    | ClientError::Transport(_) => {
                        "Unexpected error talking to the model backend.".to_owned()
                    }
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }

            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        // Log the full error chain before discarding it so diagnostic detail
        // is preserved in the server logs even though clients only see a
        // generic message.
        error!(error = ?e, "converting anyhow error to ServerError::Internal");
        ServerError::Internal(e.to_string())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
