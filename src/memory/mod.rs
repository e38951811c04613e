//! Conversation memory
//!
//! Append-only message history and the in-memory session registry.
//! Nothing here outlives the process.

pub mod sessions;
pub mod store;

pub use sessions::{SessionStore, SharedSession};
pub use store::{ConversationLog, Message, MessageRole};
