//! One chat turn: user message in, assistant reply (and tool cards) out.

use std::time::Instant;

use lb_domain::config::{AnalysisTiming, ExtractionMode};
use lb_domain::error::Result;
use lb_domain::tool::{ToolDefinition, Turn};
use lb_domain::trace::TraceEvent;
use lb_providers::{ChatRequest, ChatResponse};
use lb_sessions::sanitize;
use lb_tools::ToolResultCard;
use serde::Serialize;

use crate::runtime::dispatch::{dispatch_tool_calls, fallback_reply, needs_fallback};
use crate::state::AppState;

/// Reply stored when the model returns neither text nor tool calls.
pub const EMPTY_REPLY: &str = "Got it.";

/// Body of a successful chat response.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub response: String,
    /// `None` when no tool was requested, otherwise one card per resolved
    /// `show_food_image` call (possibly none).
    pub tool_results: Option<Vec<ToolResultCard>>,
}

/// Run one turn for `session_id`.
///
/// Only the first completion call can fail the turn. By then the user turn
/// is already in the session buffer, so a retry sees it. Persistence and
/// lead analysis failures are logged and never surface here.
pub async fn run_chat_turn(state: &AppState, session_id: &str, message: &str) -> Result<ChatOutcome> {
    let session = state.sessions.get_or_create(session_id).await;
    session.append(Turn::user(message));

    let tools = state.tools.definitions();
    let first = complete(state, sanitize(&session.snapshot()), tools, "chat").await?;

    let calls = first.tool_calls;
    let mut reply = first.content;
    let mut tool_results = None;

    if calls.is_empty() {
        if reply.trim().is_empty() {
            reply = EMPTY_REPLY.to_owned();
        }
        session.append(Turn::assistant(reply.clone()));
    } else {
        if needs_fallback(&reply) {
            if let Some(text) = fallback_reply(&state.tools, &calls) {
                reply = text;
            }
        }
        session.append(Turn::assistant_with_tools(reply.clone(), calls.clone()));

        let dispatched = dispatch_tool_calls(&state.tools, &session, &calls);
        tool_results = Some(dispatched.cards);

        if dispatched.executed > 0 {
            match complete(state, sanitize(&session.snapshot()), Vec::new(), "tool_followup").await {
                Ok(follow) if !follow.content.trim().is_empty() => {
                    reply = follow.content;
                    session.append(Turn::assistant(reply.clone()));
                }
                Ok(_) => {
                    tracing::debug!(session_id, "follow-up completion was empty, keeping first reply");
                }
                Err(e) => {
                    tracing::warn!(session_id, error = %e, "follow-up completion failed, keeping first reply");
                }
            }
        }
    }

    state.sessions.persist(&session).await;

    if state.config.extraction.mode != ExtractionMode::Off {
        let turns = sanitize(&session.snapshot());
        match state.config.extraction.timing {
            AnalysisTiming::Sync => state.leads.analyze_best_effort(session_id, &turns).await,
            AnalysisTiming::Background => {
                let leads = state.leads.clone();
                let session_id = session_id.to_owned();
                tokio::spawn(async move {
                    leads.analyze_best_effort(&session_id, &turns).await;
                });
            }
        }
    }

    if reply.trim().is_empty() {
        reply = EMPTY_REPLY.to_owned();
    }
    Ok(ChatOutcome {
        response: reply,
        tool_results,
    })
}

async fn complete(
    state: &AppState,
    turns: Vec<Turn>,
    tools: Vec<ToolDefinition>,
    purpose: &str,
) -> Result<ChatResponse> {
    let with_tools = !tools.is_empty();
    let req = ChatRequest::new(turns).with_tools(tools);
    let started = Instant::now();
    let resp = state.llm.chat(&req).await?;

    TraceEvent::LlmRequest {
        provider: state.llm.provider_id().to_owned(),
        model: resp.model.clone(),
        purpose: purpose.to_owned(),
        with_tools,
        duration_ms: started.elapsed().as_millis() as u64,
        prompt_tokens: resp.usage.map(|u| u.prompt_tokens),
        completion_tokens: resp.usage.map(|u| u.completion_tokens),
    }
    .emit();

    Ok(resp)
}
