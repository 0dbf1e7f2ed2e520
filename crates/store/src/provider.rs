//! The `ConversationStore` trait: one row per conversation, keyed by the
//! client-generated session id, holding the turn history and the lead
//! columns side by side.

use async_trait::async_trait;
use lb_domain::error::Result;
use lb_domain::lead::{LeadRecord, LeadSummary};
use lb_domain::tool::Turn;
use serde_json::Value;

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Stored turns for a conversation.
    ///
    /// `Ok(None)` when no row exists. A row whose `messages` column is null
    /// yields an empty list.
    async fn fetch_messages(&self, conversation_id: &str) -> Result<Option<Vec<Turn>>>;

    /// Insert-or-replace the `messages` column. Lead columns are untouched.
    async fn upsert_messages(&self, conversation_id: &str, turns: &[Turn]) -> Result<()>;

    /// Insert-or-replace every lead column. `messages` is untouched.
    async fn upsert_lead(&self, conversation_id: &str, lead: &LeadRecord) -> Result<()>;

    /// All rows, newest first.
    async fn list_summaries(&self) -> Result<Vec<LeadSummary>>;

    /// Remove the row. Deleting a missing row is not an error.
    async fn delete(&self, conversation_id: &str) -> Result<()>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Decode a stored `messages` column.
///
/// Entries that do not decode as a turn are skipped instead of failing the
/// whole conversation; null and non-array values decode as empty.
pub fn turns_from_value(value: Value) -> Vec<Turn> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Turn>(item) {
                Ok(turn) => Some(turn),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping undecodable stored turn");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_domain::tool::Role;
    use serde_json::json;

    #[test]
    fn skips_bad_entries() {
        let turns = turns_from_value(json!([
            {"role": "system", "content": "hi"},
            {"role": "narrator", "content": "?"},
            "garbage",
            {"role": "user", "content": "Wagyu please"}
        ]));
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Role::User);
    }

    #[test]
    fn null_column_is_empty() {
        assert!(turns_from_value(Value::Null).is_empty());
        assert!(turns_from_value(json!({"not": "a list"})).is_empty());
    }
}
