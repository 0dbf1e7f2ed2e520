//! Session store: cache in front of the conversation table.

use std::sync::Arc;

use lb_domain::tool::Turn;
use lb_domain::trace::{SessionSource, TraceEvent};
use lb_store::ConversationStore;

use crate::cache::{SessionCache, SessionHandle};
use crate::sanitize::sanitize;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct SessionStore {
    cache: SessionCache,
    backend: Arc<dyn ConversationStore>,
    system_prompt: String,
}

impl SessionStore {
    pub fn new(
        cache: SessionCache,
        backend: Arc<dyn ConversationStore>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            backend,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Return the live handle for `session_id`, loading or seeding it on a
    /// cache miss.
    ///
    /// A stored history is adopted after sanitization. A missing row, an
    /// empty history or a failed load all start a fresh conversation with a
    /// single system turn; load failures are logged, never returned.
    pub async fn get_or_create(&self, session_id: &str) -> SessionHandle {
        if let Some(handle) = self.cache.get(session_id) {
            TraceEvent::SessionResolved {
                session_id: session_id.to_owned(),
                source: SessionSource::Cache,
                turns: handle.len(),
            }
            .emit();
            return handle;
        }

        let loaded = match self.backend.fetch_messages(session_id).await {
            Ok(Some(turns)) => Some(sanitize(&turns)).filter(|t| !t.is_empty()),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    backend = self.backend.backend(),
                    error = %e,
                    "failed to load stored conversation, starting fresh"
                );
                None
            }
        };

        let (source, turns) = match loaded {
            Some(turns) => (SessionSource::Store, turns),
            None => (
                SessionSource::Seeded,
                vec![Turn::system(self.system_prompt.clone())],
            ),
        };

        let handle = self
            .cache
            .get_or_insert(SessionHandle::new(session_id, turns));

        TraceEvent::SessionResolved {
            session_id: session_id.to_owned(),
            source,
            turns: handle.len(),
        }
        .emit();
        handle
    }

    /// Upsert the sanitized history. Returns whether the write succeeded;
    /// failures are logged and the in-memory conversation carries on.
    pub async fn persist(&self, handle: &SessionHandle) -> bool {
        let turns = sanitize(&handle.snapshot());
        let ok = match self.backend.upsert_messages(handle.id(), &turns).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    session_id = %handle.id(),
                    backend = self.backend.backend(),
                    error = %e,
                    "failed to persist conversation"
                );
                false
            }
        };

        TraceEvent::SessionPersisted {
            session_id: handle.id().to_owned(),
            turns: turns.len(),
            ok,
        }
        .emit();
        ok
    }

    /// Forget the cached history so the next message reloads or reseeds.
    pub fn evict(&self, session_id: &str) -> bool {
        self.cache.remove(session_id)
    }
}
