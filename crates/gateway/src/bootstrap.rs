//! AppState construction shared by `serve`, `run` and `analyze`, so CLI
//! commands boot the same pipeline without an HTTP listener.

use std::sync::Arc;

use anyhow::Context;
use sha2::{Digest, Sha256};

use lb_domain::config::{Config, ConfigSeverity, StoreBackend};
use lb_providers::{LlmProvider, OpenAiCompatProvider};
use lb_store::{ConversationStore, MemoryConversationStore, RestConversationStore};
use lb_tools::{MenuCatalog, ToolRegistry};

use crate::prompts;
use crate::state::AppState;

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        anyhow::bail!("config validation failed with {error_count} error(s)");
    }

    // ── Completion provider ──────────────────────────────────────────
    let llm: Arc<dyn LlmProvider> = Arc::new(
        OpenAiCompatProvider::from_config(&config.llm)
            .context("initializing completion provider")?,
    );
    tracing::info!(
        provider = %config.llm.id,
        base_url = %config.llm.base_url,
        model = %config.llm.model,
        "completion provider ready"
    );

    // ── Conversation store ───────────────────────────────────────────
    let store: Arc<dyn ConversationStore> = match config.store.backend {
        StoreBackend::Rest => Arc::new(
            RestConversationStore::new(&config.store).context("initializing conversation store")?,
        ),
        StoreBackend::Memory => Arc::new(MemoryConversationStore::new()),
    };
    tracing::info!(backend = store.backend(), table = %config.store.table, "conversation store ready");

    // ── Menu + tools ─────────────────────────────────────────────────
    let catalog = match &config.tools.menu_path {
        Some(path) => MenuCatalog::load(path)
            .with_context(|| format!("loading menu {}", path.display()))?,
        None => MenuCatalog::default(),
    };
    let catalog = Arc::new(catalog);
    let tools = if config.tools.enabled {
        ToolRegistry::new(catalog.clone())
    } else {
        ToolRegistry::empty(catalog.clone())
    };
    tracing::info!(
        brand = %catalog.house.brand,
        dishes = catalog.dishes.len(),
        tools = tools.definitions().len(),
        "menu catalogue ready"
    );

    // ── System prompt ────────────────────────────────────────────────
    let system_prompt = prompts::resolve_system_prompt(&config.sessions, &catalog)?;
    tracing::info!(chars = system_prompt.len(), "system prompt ready");

    // ── Pipeline ─────────────────────────────────────────────────────
    let mut state = AppState::new(config.clone(), llm, store, tools, system_prompt)
        .context("initializing lead extractor")?;
    tracing::info!(
        mode = ?config.extraction.mode,
        timing = ?config.extraction.timing,
        source = state.leads.source_name(),
        cache_capacity = config.sessions.cache_capacity,
        "session store + lead extractor ready"
    );

    // ── API token (read once, hash for constant-time comparison) ─────
    let env_var = &config.server.api_token_env;
    state.api_token_hash = match std::env::var(env_var).ok().filter(|t| !t.is_empty()) {
        Some(token) => {
            tracing::info!(source = %format!("env:{env_var}"), "dashboard bearer-token auth enabled");
            Some(Sha256::digest(token.as_bytes()).to_vec())
        }
        None => {
            tracing::warn!("dashboard bearer-token auth DISABLED, set the {env_var} env var");
            None
        }
    };

    Ok(state)
}
