//! Conversation log
//!
//! Append-only message history for one chat session. Insertion order is
//! display order; messages are never edited or removed.

use crate::glossary::GlossaryEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const WELCOME_TEXT: &str = "Hello! I'm your Fund Terminology Assistant. I can help you understand financial terms like ESG, Alpha, Sharpe Ratio, and more. Just ask me about any fund-related terminology!";

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Bot,
}

/// A single message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub message_id: Uuid,
    pub role: MessageRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Glossary keys found in the triggering query, canonical order
    pub matched_terms: Vec<String>,
    /// Verified definition of `matched_terms[0]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_definition: Option<GlossaryEntry>,
    pub is_error: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            role: MessageRole::User,
            text: text.into(),
            created_at: Utc::now(),
            matched_terms: Vec::new(),
            attached_definition: None,
            is_error: false,
        }
    }

    pub fn bot(
        text: impl Into<String>,
        matched_terms: Vec<String>,
        attached_definition: Option<GlossaryEntry>,
        is_error: bool,
    ) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            role: MessageRole::Bot,
            text: text.into(),
            created_at: Utc::now(),
            matched_terms,
            attached_definition,
            is_error,
        }
    }

    pub fn welcome() -> Self {
        Self::bot(WELCOME_TEXT, Vec::new(), None, false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    /// New log seeded with the greeting
    pub fn new() -> Self {
        Self {
            messages: vec![Message::welcome()],
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Full history in insertion order
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}
