//! On-demand lead analysis for the dashboard.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use lb_domain::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::api_error;
use crate::runtime::LeadAnalysis;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeBody {
    #[serde(default, rename = "conversationId", alias = "conversation_id")]
    pub conversation_id: Option<String>,
}

/// Analysis as the dashboard reads it (camelCase, like the extraction
/// schema).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisView<'a> {
    customer_name: &'a str,
    customer_email: &'a str,
    customer_phone: &'a str,
    customer_address: &'a str,
    order_time: &'a str,
    order_item: &'a str,
    special_notes: &'a str,
    lead_quality: &'static str,
    user_intent: lb_domain::lead::UserIntent,
    analyzed_at: String,
}

impl<'a> From<&'a LeadAnalysis> for AnalysisView<'a> {
    fn from(a: &'a LeadAnalysis) -> Self {
        let lead = &a.lead;
        Self {
            customer_name: &lead.customer_name,
            customer_email: &lead.customer_email,
            customer_phone: &lead.customer_phone,
            customer_address: &lead.customer_address,
            order_time: &lead.order_time,
            order_item: &lead.order_item,
            special_notes: &lead.special_notes,
            lead_quality: lead.lead_quality.as_str(),
            user_intent: a.intent,
            analyzed_at: lead.analyzed_at.to_rfc3339(),
        }
    }
}

/// `POST /api/analyze_conversation`
///
/// Body: `{ "conversationId": "..." }`. Re-runs lead extraction on the
/// stored history and overwrites the lead columns.
pub async fn analyze_conversation(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Response {
    let id = body
        .ok()
        .and_then(|Json(b)| b.conversation_id)
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty());
    let Some(id) = id else {
        return api_error(StatusCode::BAD_REQUEST, "Missing conversationId");
    };

    let turns = match state.store.fetch_messages(&id).await {
        Ok(Some(turns)) => turns,
        Ok(None) => return api_error(StatusCode::NOT_FOUND, "Conversation not found"),
        Err(e) => {
            tracing::error!(conversation_id = %id, error = %e, "fetching conversation failed");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to analyze conversation");
        }
    };

    match state.leads.analyze(&id, &turns).await {
        Ok(analysis) => Json(json!({
            "success": true,
            "analysis": AnalysisView::from(&analysis),
            "parse": analysis.parse,
            "message": "Conversation analyzed successfully",
        }))
        .into_response(),
        Err(Error::Store(e)) => {
            tracing::error!(conversation_id = %id, error = %e, "saving analysis failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save analysis to database",
            )
        }
        Err(e) => {
            tracing::error!(conversation_id = %id, error = %e, "analysis failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to analyze conversation")
        }
    }
}
