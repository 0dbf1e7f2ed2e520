//! Conversation sessions for leadbot.
//!
//! A session is the ordered turn history of one chat widget conversation,
//! keyed by the id the browser generated. Histories live in a bounded
//! process-local cache and are mirrored to the conversation store after
//! every exchange.

pub mod cache;
pub mod sanitize;
pub mod store;

pub use cache::{SessionCache, SessionHandle};
pub use sanitize::sanitize;
pub use store::SessionStore;
