//! Fund Terminology Assistant
//!
//! Backend for a fund analytics dashboard:
//! - Answers terminology questions from a verified glossary
//! - Forwards the same question to an LLM and merges both answers
//! - Keeps an append-only conversation log per chat session
//! - Wraps the external fund data service for the dashboard tables
//!
//! CHAT LOOP:
//! QUERY → EXTRACT TERMS → AWAIT ANSWER → RECONCILE → APPEND

pub mod api;
pub mod completion;
pub mod config;
pub mod conversational;
pub mod error;
pub mod funds;
pub mod glossary;
pub mod memory;
pub mod models;
pub mod reconciler;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use glossary::{Glossary, GlossaryEntry, TermExtractor};
pub use memory::{ConversationLog, Message, MessageRole};
pub use reconciler::AnswerReconciler;
