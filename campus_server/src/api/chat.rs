//! Chat proxy handler.

use super::{
    AppState,
    error::{ApiError, ApiResult},
};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    pub message: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Answer a help-desk question.
///
/// # Errors
///
/// - `400 Bad Request`: `message` missing, empty, or not a string
/// - `500 Internal Server Error`: upstream not configured or unreachable
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatPayload>,
) -> ApiResult<Json<ChatResponse>> {
    let message = payload
        .message
        .as_ref()
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::bad_request("message required"))?;

    match state.chat.reply(message).await {
        Ok(reply) => Ok(Json(ChatResponse { reply })),
        Err(e) => {
            tracing::error!("Chat proxy error: {e}");
            Err(ApiError::internal(e.to_string()))
        }
    }
}
