use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Classification
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadQuality {
    Good,
    Ok,
    Spam,
}

impl LeadQuality {
    /// `good` when either contact channel is present, otherwise `spam`.
    pub fn from_contacts(email: &str, phone: &str) -> Self {
        if email.trim().is_empty() && phone.trim().is_empty() {
            LeadQuality::Spam
        } else {
            LeadQuality::Good
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "good" => Some(LeadQuality::Good),
            "ok" => Some(LeadQuality::Ok),
            "spam" => Some(LeadQuality::Spam),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LeadQuality::Good => "good",
            LeadQuality::Ok => "ok",
            LeadQuality::Spam => "spam",
        }
    }
}

/// What the customer was trying to do in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIntent {
    Order,
    AskInfo,
    Other,
}

impl UserIntent {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "order" => UserIntent::Order,
            "ask_info" => UserIntent::AskInfo,
            _ => UserIntent::Other,
        }
    }
}

/// How the stored `lead_quality` is derived from the model's proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityPolicy {
    /// Contact rule only; the model's label is ignored.
    #[default]
    Contact,
    /// A model-assigned `ok` survives; everything else uses the contact rule.
    PreserveOk,
}

impl QualityPolicy {
    pub fn resolve(self, proposed: Option<LeadQuality>, email: &str, phone: &str) -> LeadQuality {
        match (self, proposed) {
            (QualityPolicy::PreserveOk, Some(LeadQuality::Ok)) => LeadQuality::Ok,
            _ => LeadQuality::from_contacts(email, phone),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Records
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Structured customer summary derived from one conversation.
///
/// Field names match the row-store columns. Every analysis writes every
/// field, blanks included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub order_time: String,
    pub order_item: String,
    pub special_notes: String,
    pub lead_quality: LeadQuality,
    pub analyzed_at: DateTime<Utc>,
}

/// One dashboard row. Columns are optional because rows exist before their
/// first analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadSummary {
    pub conversation_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub order_time: Option<String>,
    #[serde(default)]
    pub order_item: Option<String>,
    #[serde(default)]
    pub special_notes: Option<String>,
    #[serde(default)]
    pub lead_quality: Option<String>,
    #[serde(default)]
    pub analyzed_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_contacts_are_spam() {
        assert_eq!(LeadQuality::from_contacts("", ""), LeadQuality::Spam);
        assert_eq!(LeadQuality::from_contacts("  ", "\t"), LeadQuality::Spam);
    }

    #[test]
    fn either_contact_is_good() {
        assert_eq!(LeadQuality::from_contacts("a@b.com", ""), LeadQuality::Good);
        assert_eq!(LeadQuality::from_contacts("", "0901 234 567"), LeadQuality::Good);
    }

    #[test]
    fn contact_policy_ignores_model_label() {
        let q = QualityPolicy::Contact.resolve(Some(LeadQuality::Good), "", "");
        assert_eq!(q, LeadQuality::Spam);
        let q = QualityPolicy::Contact.resolve(Some(LeadQuality::Ok), "a@b.com", "");
        assert_eq!(q, LeadQuality::Good);
    }

    #[test]
    fn preserve_ok_keeps_only_ok() {
        let q = QualityPolicy::PreserveOk.resolve(Some(LeadQuality::Ok), "", "");
        assert_eq!(q, LeadQuality::Ok);
        let q = QualityPolicy::PreserveOk.resolve(Some(LeadQuality::Spam), "a@b.com", "");
        assert_eq!(q, LeadQuality::Good);
        let q = QualityPolicy::PreserveOk.resolve(None, "", "");
        assert_eq!(q, LeadQuality::Spam);
    }

    #[test]
    fn intent_parse_is_lenient() {
        assert_eq!(UserIntent::parse(" ORDER "), UserIntent::Order);
        assert_eq!(UserIntent::parse("ask_info"), UserIntent::AskInfo);
        assert_eq!(UserIntent::parse("browse"), UserIntent::Other);
    }

    #[test]
    fn summary_tolerates_missing_columns() {
        let s: LeadSummary =
            serde_json::from_str(r#"{"conversation_id":"s1","lead_quality":null}"#).unwrap();
        assert_eq!(s.conversation_id, "s1");
        assert!(s.lead_quality.is_none());
        assert!(s.created_at.is_none());
    }
}
