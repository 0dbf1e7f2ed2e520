//! `leadbot run` and `leadbot analyze`: one-shot pipeline commands.
//!
//! Both boot the same state as `serve` without binding a listener, which
//! makes them handy for checking credentials and prompts from a shell.

use std::sync::Arc;

use lb_domain::config::{AnalysisTiming, Config};

use crate::bootstrap;
use crate::runtime::run_chat_turn;

/// Run one chat turn and print the reply (and tool cards).
pub async fn run(
    config: Arc<Config>,
    message: String,
    session_id: String,
    json_output: bool,
) -> anyhow::Result<()> {
    if config.extraction.timing == AnalysisTiming::Background {
        tracing::warn!("background lead analysis may not finish before the command exits");
    }
    let state = bootstrap::build_app_state(config)?;

    let outcome = run_chat_turn(&state, &session_id, &message)
        .await
        .map_err(|e| anyhow::anyhow!("chat turn failed: {e}"))?;

    if json_output {
        let json = serde_json::to_string_pretty(&outcome)
            .map_err(|e| anyhow::anyhow!("serializing reply: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    println!("{}", outcome.response);
    for card in outcome.tool_results.iter().flatten() {
        eprintln!("\x1b[2m[{}: {}]\x1b[0m", card.dish_name, card.image_url);
    }
    Ok(())
}

/// Re-run lead extraction for a stored conversation and print the lead row.
pub async fn analyze(config: Arc<Config>, session_id: String) -> anyhow::Result<()> {
    let state = bootstrap::build_app_state(config)?;

    let turns = state
        .store
        .fetch_messages(&session_id)
        .await
        .map_err(|e| anyhow::anyhow!("fetching {session_id}: {e}"))?
        .ok_or_else(|| anyhow::anyhow!("conversation {session_id} not found"))?;

    let analysis = state
        .leads
        .analyze(&session_id, &turns)
        .await
        .map_err(|e| anyhow::anyhow!("analyzing {session_id}: {e}"))?;

    let json = serde_json::to_string_pretty(&analysis.lead)
        .map_err(|e| anyhow::anyhow!("serializing lead: {e}"))?;
    println!("{json}");
    eprintln!("parse: {}, intent: {:?}", analysis.parse, analysis.intent);
    Ok(())
}
