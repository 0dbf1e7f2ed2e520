//! Dashboard endpoints: list leads, read a transcript, delete a conversation.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use super::api_error;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DeleteBody {
    #[serde(default, alias = "conversationId")]
    conversation_id: Option<String>,
}

fn non_blank(id: Option<String>) -> Option<String> {
    id.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

/// `GET /api/conversations`
///
/// Lead columns of every conversation, newest first.
pub async fn list(State(state): State<AppState>) -> Response {
    match state.store.list_summaries().await {
        Ok(rows) => Json(json!({ "conversations": rows })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "listing conversations failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// `GET /api/conversations/messages?id=` (also `/api/conversations_messages`)
pub async fn messages_by_query(
    State(state): State<AppState>,
    Query(q): Query<IdQuery>,
) -> Response {
    match non_blank(q.id) {
        Some(id) => messages(&state, &id).await,
        None => api_error(StatusCode::BAD_REQUEST, "Missing conversation_id"),
    }
}

/// `GET /api/conversations/:id/messages`
pub async fn messages_by_path(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    messages(&state, &id).await
}

async fn messages(state: &AppState, id: &str) -> Response {
    match state.store.fetch_messages(id).await {
        Ok(Some(turns)) => Json(json!({ "messages": turns })).into_response(),
        Ok(None) => api_error(StatusCode::NOT_FOUND, "Conversation not found"),
        Err(e) => {
            tracing::error!(conversation_id = id, error = %e, "fetching messages failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// `DELETE /api/conversations?id=` or with body `{ "conversation_id": "..." }`
pub async fn delete_by_query(
    State(state): State<AppState>,
    Query(q): Query<IdQuery>,
    body: Bytes,
) -> Response {
    let from_body = || {
        serde_json::from_slice::<DeleteBody>(&body)
            .ok()
            .and_then(|b| non_blank(b.conversation_id))
    };
    match non_blank(q.id).or_else(from_body) {
        Some(id) => delete(&state, &id).await,
        None => api_error(StatusCode::BAD_REQUEST, "Missing conversation_id"),
    }
}

/// `DELETE /api/conversations/:id`
pub async fn delete_by_path(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    delete(&state, &id).await
}

async fn delete(state: &AppState, id: &str) -> Response {
    if let Err(e) = state.store.delete(id).await {
        tracing::error!(conversation_id = id, error = %e, "deleting conversation failed");
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }
    // Drop the live buffer too, or the next chat turn would write the
    // history back.
    state.sessions.evict(id);
    tracing::info!(conversation_id = id, "conversation deleted");
    StatusCode::NO_CONTENT.into_response()
}
