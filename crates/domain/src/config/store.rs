use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Row store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// PostgREST-compatible HTTP API (Supabase).
    #[default]
    Rest,
    /// Process-local map; data is lost on restart.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Project URL, e.g. `https://xyz.supabase.co`. Falls back to `url_env`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "d_url_env")]
    pub url_env: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    /// Table holding one row per conversation.
    #[serde(default = "d_table")]
    pub table: String,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Rest,
            url: None,
            url_env: d_url_env(),
            api_key: None,
            api_key_env: d_api_key_env(),
            table: d_table(),
            timeout_ms: d_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Explicit `url`, else the `url_env` variable.
    pub fn resolve_url(&self) -> Option<String> {
        self.url
            .clone()
            .or_else(|| std::env::var(&self.url_env).ok())
            .filter(|u| !u.trim().is_empty())
    }

    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

fn d_url_env() -> String {
    "SUPABASE_URL".into()
}
fn d_api_key_env() -> String {
    "SUPABASE_KEY".into()
}
fn d_table() -> String {
    "restaurant".into()
}
fn d_timeout_ms() -> u64 {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_restaurant_table() {
        let cfg: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.backend, StoreBackend::Rest);
        assert_eq!(cfg.table, "restaurant");
        assert_eq!(cfg.url_env, "SUPABASE_URL");
    }

    #[test]
    fn explicit_url_wins_over_env() {
        let cfg = StoreConfig {
            url: Some("https://example.supabase.co".into()),
            url_env: "LB_TEST_STORE_URL_UNSET_4411".into(),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_url().as_deref(), Some("https://example.supabase.co"));
    }

    #[test]
    fn blank_key_is_treated_as_missing() {
        let cfg = StoreConfig {
            api_key: Some("  ".into()),
            ..Default::default()
        };
        assert!(cfg.resolve_api_key().is_none());
    }

    #[test]
    fn memory_backend_parses() {
        let cfg: StoreConfig = toml::from_str(r#"backend = "memory""#).unwrap();
        assert_eq!(cfg.backend, StoreBackend::Memory);
    }
}
