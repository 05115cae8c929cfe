use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The user's message. Must be non-empty after trimming.
    pub message: String,
}

/// Response body for `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    /// The assistant's reply.
    pub response: String,
}
