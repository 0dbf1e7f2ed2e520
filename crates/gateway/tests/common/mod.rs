//! Shared fixtures: a scripted completion provider and an in-memory state.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use lb_domain::config::{Config, ExtractionMode};
use lb_domain::error::{Error, Result};
use lb_domain::tool::ToolCall;
use lb_gateway::runtime::LeadExtractor;
use lb_gateway::state::AppState;
use lb_providers::{ChatRequest, ChatResponse, LlmProvider};
use lb_store::MemoryConversationStore;
use lb_tools::{MenuCatalog, ToolRegistry};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::Notify;

pub const PROMPT: &str = "You are the Kenji Shop host.";

type Scripted = std::result::Result<ChatResponse, String>;

/// Replays canned replies in order and records every request. A gated
/// reply is held back until its [`Notify`] fires.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<(Scripted, Option<Arc<Notify>>)>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(self: &Arc<Self>, content: &str) -> Arc<Self> {
        self.push(Ok(text(content)))
    }

    pub fn reply_with_calls(self: &Arc<Self>, content: &str, calls: Vec<ToolCall>) -> Arc<Self> {
        self.push(Ok(ChatResponse {
            tool_calls: calls,
            finish_reason: Some("tool_calls".into()),
            ..text(content)
        }))
    }

    /// Queue `content`, released only after `gate.notify_one()`.
    pub fn reply_gated(self: &Arc<Self>, content: &str, gate: Arc<Notify>) -> Arc<Self> {
        self.replies.lock().push_back((Ok(text(content)), Some(gate)));
        self.clone()
    }

    pub fn fail(self: &Arc<Self>, message: &str) -> Arc<Self> {
        self.push(Err(message.to_owned()))
    }

    fn push(self: &Arc<Self>, r: Scripted) -> Arc<Self> {
        self.replies.lock().push_back((r, None));
        self.clone()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().push(req.clone());
        let next = self.replies.lock().pop_front();
        let Some((reply, gate)) = next else {
            return Err(Error::Other("script exhausted".into()));
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        reply.map_err(|message| Error::Provider {
            provider: "scripted".into(),
            message,
        })
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }
}

fn text(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.to_owned(),
        model: "scripted-model".into(),
        finish_reason: Some("stop".into()),
        ..Default::default()
    }
}

pub fn show_food(id: &str, dish: &str) -> ToolCall {
    ToolCall::new(id, "show_food_image", &json!({ "dish_name": dish }))
}

/// Config with lead analysis after chat turns switched off.
pub fn quiet_config() -> Config {
    let mut config = Config::default();
    config.extraction.mode = ExtractionMode::Off;
    config
}

pub fn state_with(
    config: Config,
    llm: Arc<ScriptedProvider>,
    store: Arc<MemoryConversationStore>,
) -> AppState {
    let catalog = Arc::new(MenuCatalog::default());
    let leads = LeadExtractor::new(&config.extraction, llm.clone(), store.clone(), None)
        .expect("extractor");
    AppState::with_extractor(
        Arc::new(config),
        llm,
        store,
        ToolRegistry::new(catalog),
        PROMPT.into(),
        leads,
    )
}
