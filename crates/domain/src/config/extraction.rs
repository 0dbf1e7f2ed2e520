use serde::{Deserialize, Serialize};

use crate::lead::QualityPolicy;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Lead extraction
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where the structured lead JSON comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Ask the completion service with the extraction instructions.
    #[default]
    Direct,
    /// POST the transcript to an operator-owned webhook.
    Webhook,
    /// Never analyze after a chat turn (the analyze endpoint still works).
    Off,
}

/// Whether the chat response waits for lead analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisTiming {
    /// The reply is sent after the lead row is updated.
    #[default]
    Sync,
    /// Analysis runs on a detached task.
    Background,
}

/// What to do with the year of an extracted order time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum YearPolicy {
    #[default]
    Keep,
    /// Replace the parsed year with the current one before formatting.
    ForceCurrent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub mode: ExtractionMode,
    #[serde(default)]
    pub timing: AnalysisTiming,
    /// Model override for extraction calls. `None` uses `llm.model`.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Environment variable with the HMAC key used to sign webhook bodies.
    #[serde(default = "d_webhook_secret_env")]
    pub webhook_secret_env: String,
    #[serde(default = "d_webhook_timeout_ms")]
    pub webhook_timeout_ms: u64,
    #[serde(default)]
    pub quality_policy: QualityPolicy,
    /// Only keep `order_item` when the intent was classified as `order`.
    #[serde(default = "d_true")]
    pub require_order_intent: bool,
    #[serde(default)]
    pub year_policy: YearPolicy,
    /// IANA zone used for order times without an explicit offset.
    /// `None` uses the host's local zone.
    #[serde(default)]
    pub local_timezone: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::Direct,
            timing: AnalysisTiming::Sync,
            model: None,
            webhook_url: None,
            webhook_secret_env: d_webhook_secret_env(),
            webhook_timeout_ms: d_webhook_timeout_ms(),
            quality_policy: QualityPolicy::Contact,
            require_order_intent: true,
            year_policy: YearPolicy::Keep,
            local_timezone: None,
        }
    }
}

fn d_webhook_secret_env() -> String {
    "LEADBOT_WEBHOOK_SECRET".into()
}
fn d_webhook_timeout_ms() -> u64 {
    15_000
}
fn d_true() -> bool {
    true
}
