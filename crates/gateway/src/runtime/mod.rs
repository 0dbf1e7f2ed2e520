//! Request-time pipeline: chat turns, tool dispatch and lead extraction.
//!
//! Entry point: [`run_chat_turn`] takes a session id and a user message and
//! returns the reply plus any tool cards for the widget.

pub mod chat;
pub mod dispatch;
pub mod json_extract;
pub mod leads;
pub mod order_time;

pub use chat::{run_chat_turn, ChatOutcome, EMPTY_REPLY};
pub use leads::{LeadAnalysis, LeadExtractor};
