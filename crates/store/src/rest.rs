//! PostgREST implementation of [`ConversationStore`].
//!
//! Talks to a Supabase project (or any PostgREST server) at
//! `{url}/rest/v1/{table}`. Every call is a single attempt: failures are
//! reported to the caller, which decides whether to log or surface them.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use lb_domain::config::StoreConfig;
use lb_domain::error::{Error, Result};
use lb_domain::lead::{LeadRecord, LeadSummary};
use lb_domain::tool::Turn;
use lb_domain::trace::TraceEvent;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::provider::{turns_from_value, ConversationStore};

/// Columns returned to the dashboard listing.
const SUMMARY_COLUMNS: &str = "conversation_id,created_at,customer_name,customer_email,\
customer_phone,customer_address,order_time,order_item,special_notes,lead_quality,analyzed_at";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A REST client for the conversation table.
///
/// Created once at startup; the underlying `reqwest::Client` keeps a
/// connection pool.
#[derive(Debug, Clone)]
pub struct RestConversationStore {
    http: Client,
    table_url: String,
    api_key: String,
}

impl RestConversationStore {
    /// Build a client from `[store]`. Fails when URL or key are missing.
    pub fn new(cfg: &StoreConfig) -> Result<Self> {
        let base = cfg.resolve_url().ok_or_else(|| {
            Error::Config(format!("store URL missing: set store.url or ${}", cfg.url_env))
        })?;
        let api_key = cfg.resolve_api_key().ok_or_else(|| {
            Error::Config(format!(
                "store key missing: set store.api_key or ${}",
                cfg.api_key_env
            ))
        })?;

        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            table_url: format!("{}/rest/v1/{}", base.trim_end_matches('/'), cfg.table),
            api_key,
        })
    }

    // ── request helpers ──────────────────────────────────────────────

    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("X-Trace-Id", Uuid::new_v4().to_string())
    }

    fn eq_filter(conversation_id: &str) -> [(&'static str, String); 1] {
        [("conversation_id", format!("eq.{conversation_id}"))]
    }

    /// Send once, emit a `StoreCall` trace event, and turn non-2xx into
    /// [`Error::Store`].
    async fn execute(&self, operation: &str, rb: RequestBuilder) -> Result<Response> {
        let start = Instant::now();
        let result = self.decorate(rb).send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let resp = result.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(format!("{operation}: {e}"))
            } else {
                Error::Http(format!("{operation}: {e}"))
            }
        })?;

        let status = resp.status();
        TraceEvent::StoreCall {
            operation: operation.to_owned(),
            status: status.as_u16(),
            duration_ms,
        }
        .emit();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "{operation} returned {}: {body}",
                status.as_u16()
            )));
        }
        Ok(resp)
    }

    async fn upsert_row(&self, operation: &str, row: Value) -> Result<()> {
        let rb = self
            .http
            .post(&self.table_url)
            .query(&[("on_conflict", "conversation_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&json!([row]));
        self.execute(operation, rb).await?;
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl ConversationStore for RestConversationStore {
    async fn fetch_messages(&self, conversation_id: &str) -> Result<Option<Vec<Turn>>> {
        let rb = self
            .http
            .get(&self.table_url)
            .query(&[("select", "messages"), ("limit", "1")])
            .query(&Self::eq_filter(conversation_id));
        let resp = self.execute("fetch_messages", rb).await?;
        let rows: Vec<Value> = resp.json().await.map_err(|e| Error::Http(e.to_string()))?;

        Ok(rows.into_iter().next().map(|mut row| {
            let messages = row.get_mut("messages").map(Value::take).unwrap_or_default();
            turns_from_value(messages)
        }))
    }

    async fn upsert_messages(&self, conversation_id: &str, turns: &[Turn]) -> Result<()> {
        let row = json!({
            "conversation_id": conversation_id,
            "messages": turns,
        });
        self.upsert_row("upsert_messages", row).await
    }

    async fn upsert_lead(&self, conversation_id: &str, lead: &LeadRecord) -> Result<()> {
        let mut row = serde_json::to_value(lead)?;
        row["conversation_id"] = Value::String(conversation_id.to_owned());
        self.upsert_row("upsert_lead", row).await
    }

    async fn list_summaries(&self) -> Result<Vec<LeadSummary>> {
        let rb = self
            .http
            .get(&self.table_url)
            .query(&[("select", SUMMARY_COLUMNS), ("order", "created_at.desc")]);
        let resp = self.execute("list_summaries", rb).await?;
        resp.json().await.map_err(|e| Error::Http(e.to_string()))
    }

    async fn delete(&self, conversation_id: &str) -> Result<()> {
        let rb = self
            .http
            .delete(&self.table_url)
            .query(&Self::eq_filter(conversation_id));
        self.execute("delete", rb).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_url_is_built_from_config() {
        let cfg = StoreConfig {
            url: Some("https://abc.supabase.co/".into()),
            api_key: Some("anon".into()),
            ..Default::default()
        };
        let store = RestConversationStore::new(&cfg).unwrap();
        assert_eq!(store.table_url, "https://abc.supabase.co/rest/v1/restaurant");
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let cfg = StoreConfig {
            url: Some("https://abc.supabase.co".into()),
            api_key_env: "LB_TEST_NO_STORE_KEY_9191".into(),
            ..Default::default()
        };
        let err = RestConversationStore::new(&cfg).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn eq_filter_prefixes_operator() {
        let f = RestConversationStore::eq_filter("session-42");
        assert_eq!(f[0].0, "conversation_id");
        assert_eq!(f[0].1, "eq.session-42");
    }
}
