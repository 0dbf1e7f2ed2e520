pub mod analyze;
pub mod auth;
pub mod chat;
pub mod conversations;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Routes are split into **public** (widget chat, health) and **protected**
/// (dashboard endpoints, gated behind the `LEADBOT_API_TOKEN` bearer-token
/// middleware).
///
/// `state` is needed to wire up the auth middleware at build time.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat::chat))
        .route("/api/chat", post(chat::chat));

    let protected = Router::new()
        .route(
            "/api/conversations",
            get(conversations::list).delete(conversations::delete_by_query),
        )
        .route("/api/conversations/messages", get(conversations::messages_by_query))
        .route("/api/conversations_messages", get(conversations::messages_by_query))
        .route("/api/conversations/:id/messages", get(conversations::messages_by_path))
        .route("/api/conversations/:id", delete(conversations::delete_by_path))
        .route("/api/analyze_conversation", post(analyze::analyze_conversation))
        // Apply API auth middleware to all protected routes.
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_api_token,
        ));

    public.merge(protected)
}

/// `GET /health`
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}
