pub mod memory;
pub mod provider;
pub mod rest;

pub use memory::MemoryConversationStore;
pub use provider::{turns_from_value, ConversationStore};
pub use rest::RestConversationStore;
