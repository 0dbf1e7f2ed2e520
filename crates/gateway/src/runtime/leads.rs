//! Lead extraction: transcript in, one structured lead row out.
//!
//! The structured fields come from either the completion service (with the
//! extraction instructions) or an operator webhook. Whatever comes back is
//! parsed leniently, the quality label is recomputed from the contact
//! fields, the order time is normalized and the row is upserted with every
//! column overwritten.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use lb_domain::config::{ExtractionConfig, ExtractionMode};
use lb_domain::error::{Error, Result};
use lb_domain::lead::{LeadQuality, LeadRecord, QualityPolicy, UserIntent};
use lb_domain::tool::Turn;
use lb_domain::trace::TraceEvent;
use lb_providers::{ChatRequest, LlmProvider};
use lb_store::ConversationStore;
use serde_json::{json, Map, Value};
use sha2::Sha256;

use crate::prompts::{extraction_user_message, EXTRACTION_PROMPT};
use crate::runtime::json_extract::parse_tolerant;
use crate::runtime::order_time::{normalize, LocalZone, NormalizeOptions};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying `sha256=<hex>` over the webhook body.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

const NAME: &[&str] = &["customerName", "customer_name"];
const EMAIL: &[&str] = &["customerEmail", "customer_email"];
const PHONE: &[&str] = &["customerPhone", "customer_phone"];
const ADDRESS: &[&str] = &["customerAddress", "customer_address"];
const ORDER_TIME: &[&str] = &["orderTime", "order_time"];
const ORDER_ITEM: &[&str] = &["orderItem", "order_item"];
const NOTES: &[&str] = &["specialNotes", "special_notes"];
const QUALITY: &[&str] = &["leadQuality", "lead_quality"];
const INTENT: &[&str] = &["userIntent", "user_intent"];

/// Result of one analysis run.
#[derive(Debug, Clone)]
pub struct LeadAnalysis {
    pub lead: LeadRecord,
    pub intent: UserIntent,
    /// `parsed`, `fallback` or `empty`.
    pub parse: &'static str,
}

enum LeadSource {
    Completion {
        model: Option<String>,
    },
    Webhook {
        client: reqwest::Client,
        url: String,
        secret: Option<String>,
    },
}

/// Rules applied to the raw extracted fields.
#[derive(Debug, Clone, Copy)]
pub struct LeadRules {
    pub quality_policy: QualityPolicy,
    pub require_order_intent: bool,
    pub order_time: NormalizeOptions,
}

impl LeadRules {
    pub fn from_config(cfg: &ExtractionConfig) -> Result<Self> {
        let local = LocalZone::from_config(cfg.local_timezone.as_deref()).map_err(Error::Config)?;
        Ok(Self {
            quality_policy: cfg.quality_policy,
            require_order_intent: cfg.require_order_intent,
            order_time: NormalizeOptions {
                year_policy: cfg.year_policy,
                local,
            },
        })
    }

    /// Build the lead row from an extracted JSON object. Missing or
    /// non-string fields become blanks.
    pub fn apply(&self, fields: &Map<String, Value>, now: DateTime<Utc>) -> (LeadRecord, UserIntent) {
        let email = field(fields, EMAIL);
        let phone = field(fields, PHONE);
        let proposed = LeadQuality::parse(&field(fields, QUALITY));
        let intent = UserIntent::parse(&field(fields, INTENT));

        let order_item = if !self.require_order_intent || intent == UserIntent::Order {
            field(fields, ORDER_ITEM)
        } else {
            String::new()
        };

        let lead = LeadRecord {
            customer_name: field(fields, NAME),
            lead_quality: self.quality_policy.resolve(proposed, &email, &phone),
            customer_email: email,
            customer_phone: phone,
            customer_address: field(fields, ADDRESS),
            order_time: normalize(&field(fields, ORDER_TIME), &self.order_time, now),
            order_item,
            special_notes: field(fields, NOTES),
            analyzed_at: now,
        };
        (lead, intent)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Extractor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct LeadExtractor {
    llm: Arc<dyn LlmProvider>,
    store: Arc<dyn ConversationStore>,
    source: LeadSource,
    rules: LeadRules,
}

impl LeadExtractor {
    /// Build from the `[extraction]` section. The webhook signing secret
    /// is read from the env var named by `webhook_secret_env`.
    pub fn from_config(
        cfg: &ExtractionConfig,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn ConversationStore>,
    ) -> Result<Self> {
        let secret = std::env::var(&cfg.webhook_secret_env)
            .ok()
            .filter(|s| !s.trim().is_empty());
        Self::new(cfg, llm, store, secret)
    }

    pub fn new(
        cfg: &ExtractionConfig,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn ConversationStore>,
        webhook_secret: Option<String>,
    ) -> Result<Self> {
        let source = match cfg.mode {
            ExtractionMode::Webhook => {
                let url = cfg
                    .webhook_url
                    .clone()
                    .filter(|u| !u.trim().is_empty())
                    .ok_or_else(|| {
                        Error::Config("extraction.webhook_url is required in webhook mode".into())
                    })?;
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_millis(cfg.webhook_timeout_ms))
                    .build()
                    .map_err(|e| Error::Http(e.to_string()))?;
                LeadSource::Webhook {
                    client,
                    url,
                    secret: webhook_secret,
                }
            }
            // The analyze endpoint still works with analysis after chat
            // turns switched off.
            ExtractionMode::Direct | ExtractionMode::Off => LeadSource::Completion {
                model: cfg.model.clone(),
            },
        };

        Ok(Self {
            llm,
            store,
            source,
            rules: LeadRules::from_config(cfg)?,
        })
    }

    pub fn source_name(&self) -> &'static str {
        match self.source {
            LeadSource::Completion { .. } => "completion",
            LeadSource::Webhook { .. } => "webhook",
        }
    }

    /// Analyze `turns` and overwrite the lead columns of `session_id`.
    pub async fn analyze(&self, session_id: &str, turns: &[Turn]) -> Result<LeadAnalysis> {
        let started = Instant::now();
        let transcript = transcript(turns);

        let raw = match &self.source {
            LeadSource::Completion { model } => {
                self.ask_model(model.as_deref(), &transcript).await?
            }
            LeadSource::Webhook {
                client,
                url,
                secret,
            } => {
                call_webhook(client, url, secret.as_deref(), session_id, &transcript, turns)
                    .await?
            }
        };

        let extracted = parse_tolerant(&raw);
        let parse = extracted.kind();
        if parse == "empty" {
            tracing::warn!(session_id, "lead extraction returned no JSON object");
        }
        let (lead, intent) = self.rules.apply(&extracted.into_object(), Utc::now());

        self.store.upsert_lead(session_id, &lead).await?;

        TraceEvent::LeadAnalyzed {
            session_id: session_id.to_owned(),
            lead_quality: lead.lead_quality.as_str().to_owned(),
            parse: parse.to_owned(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();

        Ok(LeadAnalysis {
            lead,
            intent,
            parse,
        })
    }

    /// Like [`analyze`](Self::analyze) but failures are only logged.
    pub async fn analyze_best_effort(&self, session_id: &str, turns: &[Turn]) {
        if let Err(e) = self.analyze(session_id, turns).await {
            tracing::warn!(session_id, error = %e, "lead analysis failed");
        }
    }

    async fn ask_model(&self, model: Option<&str>, transcript: &str) -> Result<String> {
        let req = ChatRequest {
            turns: vec![
                Turn::system(EXTRACTION_PROMPT),
                Turn::user(extraction_user_message(transcript)),
            ],
            model: model.map(str::to_owned),
            json_mode: true,
            ..Default::default()
        };
        let started = Instant::now();
        let resp = self.llm.chat(&req).await?;

        TraceEvent::LlmRequest {
            provider: self.llm.provider_id().to_owned(),
            model: resp.model.clone(),
            purpose: "lead_extraction".into(),
            with_tools: false,
            duration_ms: started.elapsed().as_millis() as u64,
            prompt_tokens: resp.usage.map(|u| u.prompt_tokens),
            completion_tokens: resp.usage.map(|u| u.completion_tokens),
        }
        .emit();

        Ok(resp.content)
    }
}

async fn call_webhook(
    client: &reqwest::Client,
    url: &str,
    secret: Option<&str>,
    session_id: &str,
    transcript: &str,
    turns: &[Turn],
) -> Result<String> {
    let body = serde_json::to_vec(&json!({
        "conversation_id": session_id,
        "transcript": transcript,
        "messages": turns,
    }))?;

    let mut req = client
        .post(url)
        .header("Content-Type", "application/json");
    if let Some(secret) = secret {
        req = req.header(SIGNATURE_HEADER, sign(secret, &body));
    }

    let resp = req.body(body).send().await.map_err(|e| {
        if e.is_timeout() {
            Error::Timeout(format!("lead webhook: {e}"))
        } else {
            Error::Http(format!("lead webhook: {e}"))
        }
    })?;
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| Error::Http(format!("lead webhook body: {e}")))?;
    if !status.is_success() {
        return Err(Error::Http(format!("lead webhook returned {status}: {text}")));
    }
    Ok(text)
}

/// `sha256=<hex>` HMAC of `body`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// `ROLE: content` lines for user and assistant turns only.
pub fn transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .filter(|t| t.is_dialogue())
        .map(|t| format!("{}: {}", t.role.as_str().to_uppercase(), t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First non-blank value under any of `keys`. Numbers are stringified.
fn field(fields: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| match fields.get(*k)? {
            Value::String(s) => Some(s.trim().to_owned()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_domain::config::YearPolicy;
    use lb_domain::tool::ToolCall;

    fn rules() -> LeadRules {
        LeadRules {
            quality_policy: QualityPolicy::Contact,
            require_order_intent: true,
            order_time: NormalizeOptions {
                year_policy: YearPolicy::Keep,
                local: LocalZone::Named(chrono_tz::Asia::Ho_Chi_Minh),
            },
        }
    }

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn transcript_skips_system_and_tool_turns() {
        let turns = vec![
            Turn::system("prompt"),
            Turn::user("show me the udon"),
            Turn::assistant_with_tools(
                "",
                vec![ToolCall::new("c1", "show_food_image", &json!({"dish_name": "Uni Truffle Udon"}))],
            ),
            Turn::tool_result("c1", "show_food_image", "{}"),
            Turn::assistant("Here it is."),
        ];
        assert_eq!(
            transcript(&turns),
            "USER: show me the udon\nASSISTANT: \nASSISTANT: Here it is."
        );
    }

    #[test]
    fn quality_is_recomputed_from_contacts() {
        let (lead, _) = rules().apply(
            &obj(json!({"customerName": "Lan", "leadQuality": "good"})),
            Utc::now(),
        );
        assert_eq!(lead.lead_quality, LeadQuality::Spam);

        let (lead, _) = rules().apply(
            &obj(json!({"customer_phone": "0901 234 567", "lead_quality": "spam"})),
            Utc::now(),
        );
        assert_eq!(lead.lead_quality, LeadQuality::Good);
        assert_eq!(lead.customer_phone, "0901 234 567");
    }

    #[test]
    fn order_item_needs_order_intent() {
        let fields = obj(json!({"orderItem": "Wagyu Steak", "userIntent": "ask_info"}));
        let (lead, intent) = rules().apply(&fields, Utc::now());
        assert_eq!(intent, UserIntent::AskInfo);
        assert_eq!(lead.order_item, "");

        let fields = obj(json!({"order_item": "Wagyu Steak", "user_intent": "ORDER"}));
        assert_eq!(rules().apply(&fields, Utc::now()).0.order_item, "Wagyu Steak");

        let relaxed = LeadRules {
            require_order_intent: false,
            ..rules()
        };
        let fields = obj(json!({"orderItem": "Wagyu Steak"}));
        assert_eq!(relaxed.apply(&fields, Utc::now()).0.order_item, "Wagyu Steak");
    }

    #[test]
    fn numbers_are_stringified_and_blanks_fall_through() {
        let fields = obj(json!({
            "customerPhone": 84901234567u64,
            "customerName": "  ",
            "customer_name": "Minh",
            "specialNotes": null,
        }));
        let (lead, _) = rules().apply(&fields, Utc::now());
        assert_eq!(lead.customer_phone, "84901234567");
        assert_eq!(lead.customer_name, "Minh");
        assert_eq!(lead.special_notes, "");
    }

    #[test]
    fn order_time_is_normalized() {
        let fields = obj(json!({"orderTime": "2024-03-05T18:30:00+07:00"}));
        let (lead, _) = rules().apply(&fields, Utc::now());
        assert_eq!(lead.order_time, "2024-03-05 18:30:00 GMT+07:00");
    }

    #[test]
    fn signature_is_stable_hex() {
        let sig = sign("topsecret", b"{}");
        assert!(sig.starts_with("sha256="));
        assert_eq!(sig.len(), "sha256=".len() + 64);
        assert_eq!(sig, sign("topsecret", b"{}"));
        assert_ne!(sig, sign("other", b"{}"));
    }
}
