//! Widget chat endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use super::api_error;
use crate::runtime::run_chat_turn;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "sessionId", alias = "session_id")]
    pub session_id: Option<String>,
}

/// `POST /chat` and `POST /api/chat`
///
/// Body: `{ "message": "...", "sessionId": "..." }`. Replies with
/// `{ "response": "...", "tool_results": [...] | null }`.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(b)) => b,
        Err(e) => {
            tracing::debug!(error = %e, "rejected chat body");
            return api_error(StatusCode::BAD_REQUEST, "Missing message or sessionId");
        }
    };

    let message = body.message.unwrap_or_default();
    let session_id = body.session_id.as_deref().map(str::trim).unwrap_or_default();
    if message.trim().is_empty() || session_id.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "Missing message or sessionId");
    }

    match run_chat_turn(&state, session_id, &message).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => {
            tracing::error!(session_id, error = %e, "chat turn failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get response from the language model",
            )
        }
    }
}
