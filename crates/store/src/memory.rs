//! In-process [`ConversationStore`] for local development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lb_domain::error::Result;
use lb_domain::lead::{LeadRecord, LeadSummary};
use lb_domain::tool::Turn;
use parking_lot::RwLock;

use crate::provider::ConversationStore;

#[derive(Debug, Clone)]
struct Row {
    seq: u64,
    created_at: DateTime<Utc>,
    messages: Vec<Turn>,
    lead: Option<LeadRecord>,
}

impl Row {
    fn summary(&self, conversation_id: &str) -> LeadSummary {
        let mut s = LeadSummary {
            conversation_id: conversation_id.to_owned(),
            created_at: Some(self.created_at.to_rfc3339()),
            ..Default::default()
        };
        if let Some(lead) = &self.lead {
            s.customer_name = Some(lead.customer_name.clone());
            s.customer_email = Some(lead.customer_email.clone());
            s.customer_phone = Some(lead.customer_phone.clone());
            s.customer_address = Some(lead.customer_address.clone());
            s.order_time = Some(lead.order_time.clone());
            s.order_item = Some(lead.order_item.clone());
            s.special_notes = Some(lead.special_notes.clone());
            s.lead_quality = Some(lead.lead_quality.as_str().to_owned());
            s.analyzed_at = Some(lead.analyzed_at.to_rfc3339());
        }
        s
    }
}

#[derive(Default)]
struct Inner {
    next_seq: u64,
    rows: HashMap<String, Row>,
}

impl Inner {
    fn row_mut(&mut self, conversation_id: &str) -> &mut Row {
        let seq = self.next_seq;
        let row = self
            .rows
            .entry(conversation_id.to_owned())
            .or_insert_with(|| Row {
                seq,
                created_at: Utc::now(),
                messages: Vec::new(),
                lead: None,
            });
        if row.seq == seq {
            self.next_seq += 1;
        }
        row
    }
}

/// Conversations held in a `RwLock<HashMap>`; nothing survives a restart.
#[derive(Default)]
pub struct MemoryConversationStore {
    inner: RwLock<Inner>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored lead columns, if the conversation was analyzed.
    pub fn lead(&self, conversation_id: &str) -> Option<LeadRecord> {
        self.inner
            .read()
            .rows
            .get(conversation_id)
            .and_then(|r| r.lead.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn fetch_messages(&self, conversation_id: &str) -> Result<Option<Vec<Turn>>> {
        Ok(self
            .inner
            .read()
            .rows
            .get(conversation_id)
            .map(|r| r.messages.clone()))
    }

    async fn upsert_messages(&self, conversation_id: &str, turns: &[Turn]) -> Result<()> {
        self.inner.write().row_mut(conversation_id).messages = turns.to_vec();
        Ok(())
    }

    async fn upsert_lead(&self, conversation_id: &str, lead: &LeadRecord) -> Result<()> {
        self.inner.write().row_mut(conversation_id).lead = Some(lead.clone());
        Ok(())
    }

    async fn list_summaries(&self) -> Result<Vec<LeadSummary>> {
        let inner = self.inner.read();
        let mut rows: Vec<(&String, &Row)> = inner.rows.iter().collect();
        rows.sort_by(|a, b| {
            b.1.created_at
                .cmp(&a.1.created_at)
                .then(b.1.seq.cmp(&a.1.seq))
        });
        Ok(rows.into_iter().map(|(id, row)| row.summary(id)).collect())
    }

    async fn delete(&self, conversation_id: &str) -> Result<()> {
        self.inner.write().rows.remove(conversation_id);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_domain::lead::LeadQuality;

    fn lead(email: &str) -> LeadRecord {
        LeadRecord {
            customer_name: "Mai".into(),
            customer_email: email.into(),
            customer_phone: String::new(),
            customer_address: String::new(),
            order_time: String::new(),
            order_item: String::new(),
            special_notes: String::new(),
            lead_quality: LeadQuality::from_contacts(email, ""),
            analyzed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn missing_row_is_none() {
        let store = MemoryConversationStore::new();
        assert!(store.fetch_messages("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn messages_and_lead_are_independent_columns() {
        let store = MemoryConversationStore::new();
        store
            .upsert_messages("s1", &[Turn::system("sys"), Turn::user("hi")])
            .await
            .unwrap();
        store.upsert_lead("s1", &lead("a@b.com")).await.unwrap();
        store.upsert_messages("s1", &[Turn::system("sys")]).await.unwrap();

        assert_eq!(store.fetch_messages("s1").await.unwrap().unwrap().len(), 1);
        assert_eq!(store.lead("s1").unwrap().customer_email, "a@b.com");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn lead_upsert_creates_row_with_empty_messages() {
        let store = MemoryConversationStore::new();
        store.upsert_lead("s2", &lead("")).await.unwrap();
        assert_eq!(store.fetch_messages("s2").await.unwrap(), Some(vec![]));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryConversationStore::new();
        for id in ["a", "b", "c"] {
            store.upsert_messages(id, &[]).await.unwrap();
        }
        let ids: Vec<String> = store
            .list_summaries()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.conversation_id)
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryConversationStore::new();
        store.upsert_messages("s1", &[]).await.unwrap();
        store.delete("s1").await.unwrap();
        store.delete("s1").await.unwrap();
        assert!(store.is_empty());
    }
}
