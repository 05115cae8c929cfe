use parley_core::{ReadinessState, ReadinessStatus};
use serde::Serialize;
use utoipa::ToSchema;

/// Response body for `GET /status`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusResponse {
    /// `"loading"`, `"ready"`, or `"error"`.
    #[schema(example = "loading")]
    pub state: String,
    /// Human-readable progress or failure detail.
    pub message: String,
}

impl From<ReadinessStatus> for StatusResponse {
    fn from(status: ReadinessStatus) -> Self {
        let state = match status.state {
            ReadinessState::Loading => "loading",
            ReadinessState::Ready => "ready",
            ReadinessState::Error => "error",
        };
        Self { state: state.to_owned(), message: status.message }
    }
}

/// Response body for `GET /has-context`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HasContextResponse {
    pub has_context: bool,
}

/// Response body for `POST /clear-history`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClearedResponse {
    pub cleared: bool,
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn readiness_states_map_to_lowercase_strings() {
        let response = StatusResponse::from(ReadinessStatus::ready("backend is ready"));
        assert_eq!(response.state, "ready");
        assert_eq!(response.message, "backend is ready");

        let response = StatusResponse::from(ReadinessStatus::error("boom"));
        assert_eq!(response.state, "error");
    }
}
