use std::sync::Arc;

use lb_domain::config::Config;
use lb_domain::error::Result;
use lb_providers::LlmProvider;
use lb_sessions::{SessionCache, SessionStore};
use lb_store::ConversationStore;
use lb_tools::ToolRegistry;

use crate::runtime::LeadExtractor;

/// Shared application state passed to all API handlers.
///
/// Fields are grouped by concern:
/// - **Core services**: config, completion provider, conversation store
/// - **Conversation pipeline**: sessions, tools, lead extractor
/// - **Security**: dashboard token hash
#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub llm: Arc<dyn LlmProvider>,
    pub store: Arc<dyn ConversationStore>,

    // ── Conversation pipeline ─────────────────────────────────────────
    pub sessions: Arc<SessionStore>,
    pub tools: Arc<ToolRegistry>,
    pub leads: Arc<LeadExtractor>,

    // ── Security ──────────────────────────────────────────────────────
    /// SHA-256 of the dashboard API token, read once at startup.
    /// `None` means dashboard auth is disabled (dev mode).
    pub api_token_hash: Option<Vec<u8>>,
}

impl AppState {
    /// Wire the pipeline around already-built services. The lead extractor
    /// reads its webhook secret from the environment.
    pub fn new(
        config: Arc<Config>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn ConversationStore>,
        tools: ToolRegistry,
        system_prompt: String,
    ) -> Result<Self> {
        let leads = LeadExtractor::from_config(&config.extraction, llm.clone(), store.clone())?;
        Ok(Self::with_extractor(config, llm, store, tools, system_prompt, leads))
    }

    pub fn with_extractor(
        config: Arc<Config>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn ConversationStore>,
        tools: ToolRegistry,
        system_prompt: String,
        leads: LeadExtractor,
    ) -> Self {
        let sessions = SessionStore::new(
            SessionCache::new(config.sessions.cache_capacity),
            store.clone(),
            system_prompt,
        );
        Self {
            config,
            llm,
            store,
            sessions: Arc::new(sessions),
            tools: Arc::new(tools),
            leads: Arc::new(leads),
            api_token_hash: None,
        }
    }
}
