use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Completion service
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection settings for the OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Identifier used in logs and error messages.
    #[serde(default = "d_provider_id")]
    pub id: String,
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    /// Plaintext key. Prefer `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    /// Fixed per-request timeout. There are no retries.
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            id: d_provider_id(),
            base_url: d_base_url(),
            model: d_model(),
            api_key: None,
            api_key_env: d_api_key_env(),
            timeout_ms: d_timeout_ms(),
            temperature: None,
        }
    }
}

fn d_provider_id() -> String {
    "openai".into()
}
fn d_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_model() -> String {
    "gpt-5-nano".into()
}
fn d_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn d_timeout_ms() -> u64 {
    60_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_openai() {
        let cfg: LlmConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.base_url, "https://api.openai.com/v1");
        assert_eq!(cfg.model, "gpt-5-nano");
        assert_eq!(cfg.api_key_env, "OPENAI_API_KEY");
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn local_endpoint_override() {
        let cfg: LlmConfig = toml::from_str(
            r#"
            id = "ollama"
            base_url = "http://localhost:11434/v1"
            model = "llama3.1"
            timeout_ms = 15000
            temperature = 0.2
        "#,
        )
        .unwrap();
        assert_eq!(cfg.id, "ollama");
        assert_eq!(cfg.timeout_ms, 15_000);
        assert_eq!(cfg.temperature, Some(0.2));
    }
}
