//! Shared utility functions for provider adapters.

use lb_domain::config::LlmConfig;
use lb_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the API key for the completion service.
///
/// Precedence:
/// 1. `api_key` field (plaintext, warns)
/// 2. the `api_key_env` environment variable
pub fn resolve_api_key(cfg: &LlmConfig) -> Result<String> {
    if let Some(ref key) = cfg.api_key {
        tracing::warn!(
            "API key loaded from plaintext config field 'llm.api_key'; \
             prefer 'llm.api_key_env'"
        );
        return Ok(key.clone());
    }

    match std::env::var(&cfg.api_key_env) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::Auth(format!(
            "environment variable '{}' not set or empty",
            cfg.api_key_env
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_api_key_plaintext() {
        let cfg = LlmConfig {
            api_key: Some("sk-test-123".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&cfg).unwrap(), "sk-test-123");
    }

    #[test]
    fn resolve_api_key_env_var() {
        let var_name = "LB_TEST_RESOLVE_ENV_KEY_1234";
        std::env::set_var(var_name, "env-secret-value");
        let cfg = LlmConfig {
            api_key_env: var_name.into(),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&cfg).unwrap(), "env-secret-value");
        std::env::remove_var(var_name);
    }

    #[test]
    fn resolve_api_key_env_var_missing() {
        let cfg = LlmConfig {
            api_key_env: "LB_TEST_NONEXISTENT_VAR_8888".into(),
            ..Default::default()
        };
        let err = resolve_api_key(&cfg).unwrap_err();
        assert!(err.to_string().contains("LB_TEST_NONEXISTENT_VAR_8888"));
    }

    #[test]
    fn plaintext_takes_precedence_over_env() {
        let cfg = LlmConfig {
            api_key: Some("plaintext-wins".into()),
            api_key_env: "LB_TEST_SHOULD_NOT_BE_READ".into(),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&cfg).unwrap(), "plaintext-wins");
    }
}
