//! Bounded, least-recently-used session cache.
//!
//! Owned by [`SessionStore`](crate::SessionStore) and injected wherever a
//! cache is needed; there is no process-wide instance.

use std::collections::HashMap;
use std::sync::Arc;

use lb_domain::tool::Turn;
use parking_lot::Mutex;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session handle
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Shared turn buffer for one conversation.
///
/// Cloning is cheap; every clone appends to the same buffer. Appends from
/// concurrent requests on one session interleave in arrival order.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Arc<str>,
    turns: Arc<Mutex<Vec<Turn>>>,
}

impl SessionHandle {
    pub fn new(id: &str, turns: Vec<Turn>) -> Self {
        Self {
            id: Arc::from(id),
            turns: Arc::new(Mutex::new(turns)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn append(&self, turn: Turn) {
        self.turns.lock().push(turn);
    }

    /// Copy of the current history.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.turns.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.lock().is_empty()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cache
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Slot {
    handle: SessionHandle,
    last_used: u64,
}

struct Inner {
    tick: u64,
    slots: HashMap<String, Slot>,
}

impl Inner {
    fn touch(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

pub struct SessionCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl SessionCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                tick: 0,
                slots: HashMap::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        let mut inner = self.inner.lock();
        let now = inner.touch();
        inner.slots.get_mut(id).map(|slot| {
            slot.last_used = now;
            slot.handle.clone()
        })
    }

    /// Insert `handle` unless another request cached this id first, in which
    /// case the existing handle wins and is returned.
    pub fn get_or_insert(&self, handle: SessionHandle) -> SessionHandle {
        let mut inner = self.inner.lock();
        let now = inner.touch();

        if let Some(slot) = inner.slots.get_mut(handle.id()) {
            slot.last_used = now;
            return slot.handle.clone();
        }

        if inner.slots.len() >= self.capacity {
            let oldest = inner
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                inner.slots.remove(&id);
                tracing::debug!(session_id = %id, "evicted least recently used session");
            }
        }

        inner.slots.insert(
            handle.id().to_owned(),
            Slot {
                handle: handle.clone(),
                last_used: now,
            },
        );
        handle
    }

    /// Drop an entry. Handles already held elsewhere stay usable.
    pub fn remove(&self, id: &str) -> bool {
        self.inner.lock().slots.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: &str) -> SessionHandle {
        SessionHandle::new(id, vec![Turn::system("s")])
    }

    #[test]
    fn clones_share_one_buffer() {
        let a = handle("s1");
        let b = a.clone();
        b.append(Turn::user("hi"));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn first_insert_wins() {
        let cache = SessionCache::new(4);
        let first = cache.get_or_insert(handle("s1"));
        first.append(Turn::user("one"));
        let second = cache.get_or_insert(handle("s1"));
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = SessionCache::new(2);
        cache.get_or_insert(handle("a"));
        cache.get_or_insert(handle("b"));
        assert!(cache.get("a").is_some());
        cache.get_or_insert(handle("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn evicted_handle_stays_usable() {
        let cache = SessionCache::new(1);
        let a = cache.get_or_insert(handle("a"));
        cache.get_or_insert(handle("b"));
        a.append(Turn::user("still here"));
        assert_eq!(a.len(), 2);
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cache = SessionCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.get_or_insert(handle("a"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn remove_reports_presence() {
        let cache = SessionCache::new(2);
        cache.get_or_insert(handle("a"));
        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
    }
}
