mod extraction;
mod llm;
mod observability;
mod server;
mod sessions;
mod store;
mod tools;

pub use extraction::*;
pub use llm::*;
pub use observability::*;
pub use server::*;
pub use sessions::*;
pub use store::*;
pub use tools::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Environment-backed secrets are only checked for presence when the
    /// feature that needs them is enabled.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }
        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError::error(
                "server.max_concurrent_requests",
                "must be greater than 0",
            ));
        }
        if self.server.cors.allowed_origins.iter().any(|o| o == "*") {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins",
            ));
        }

        if self.llm.base_url.is_empty() {
            errors.push(ConfigError::error("llm.base_url", "base_url must not be empty"));
        }
        if self.llm.model.is_empty() {
            errors.push(ConfigError::error("llm.model", "model must not be empty"));
        }
        if self.llm.timeout_ms == 0 {
            errors.push(ConfigError::error("llm.timeout_ms", "timeout must be greater than 0"));
        }
        if self.llm.api_key.is_some() {
            errors.push(ConfigError::warning(
                "llm.api_key",
                "plaintext API key in config; prefer llm.api_key_env",
            ));
        }

        if self.store.backend == StoreBackend::Rest {
            if self.store.table.is_empty() {
                errors.push(ConfigError::error("store.table", "table must not be empty"));
            }
            if self.store.resolve_url().is_none() {
                errors.push(ConfigError::error(
                    "store.url",
                    format!("no store URL: set store.url or ${}", self.store.url_env),
                ));
            }
            if self.store.resolve_api_key().is_none() {
                errors.push(ConfigError::error(
                    "store.api_key",
                    format!("no store key: set store.api_key or ${}", self.store.api_key_env),
                ));
            }
        } else {
            errors.push(ConfigError::warning(
                "store.backend",
                "memory backend keeps conversations only until restart",
            ));
        }

        if self.sessions.cache_capacity == 0 {
            errors.push(ConfigError::error(
                "sessions.cache_capacity",
                "cache_capacity must be greater than 0",
            ));
        }

        if self.extraction.mode == ExtractionMode::Webhook {
            match self.extraction.webhook_url.as_deref() {
                None | Some("") => errors.push(ConfigError::error(
                    "extraction.webhook_url",
                    "webhook mode requires a webhook_url",
                )),
                Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                    errors.push(ConfigError::error(
                        "extraction.webhook_url",
                        "webhook_url must be an http(s) URL",
                    ))
                }
                _ => {}
            }
        }
        if let Some(tz) = &self.extraction.local_timezone {
            if tz.trim().is_empty() {
                errors.push(ConfigError::error(
                    "extraction.local_timezone",
                    "timezone must not be empty when set",
                ));
            }
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            errors.push(ConfigError::error(
                "observability.sample_rate",
                "sample_rate must be between 0.0 and 1.0",
            ));
        }

        errors
    }
}
