use serde::Serialize;

/// Structured trace events emitted across all leadbot crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionResolved {
        session_id: String,
        source: SessionSource,
        turns: usize,
    },
    SessionPersisted {
        session_id: String,
        turns: usize,
        ok: bool,
    },
    LlmRequest {
        provider: String,
        model: String,
        purpose: String,
        with_tools: bool,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    ToolDispatched {
        session_id: String,
        tool_name: String,
        call_id: String,
        resolved: bool,
    },
    LeadAnalyzed {
        session_id: String,
        lead_quality: String,
        parse: String,
        duration_ms: u64,
    },
    StoreCall {
        operation: String,
        status: u16,
        duration_ms: u64,
    },
}

/// Where a session's turn buffer came from.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    Cache,
    Store,
    Seeded,
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "lb_event");
    }
}
