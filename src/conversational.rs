//! Chat session handler
//!
//! One session = one conversation log plus the shared reconciler.
//! A query appends the user's message, then exactly one bot reply.

use crate::error::AssistantError;
use crate::memory::{ConversationLog, Message};
use crate::reconciler::AnswerReconciler;
use std::sync::Arc;
use tracing::info;

/// Canned prompts offered next to the input box
pub const SUGGESTED_QUERIES: &[&str] = &[
    "What is ESG?",
    "Explain Alpha in investing",
    "What is Sharpe Ratio?",
    "Define private equity",
    "What is AUM?",
    "Explain volatility",
];

pub struct ChatSession {
    log: ConversationLog,
    reconciler: Arc<AnswerReconciler>,
}

impl ChatSession {
    pub fn new(reconciler: Arc<AnswerReconciler>) -> Self {
        Self {
            log: ConversationLog::new(),
            reconciler,
        }
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Send a user query and return the bot reply.
    ///
    /// Blank input is rejected and leaves the log untouched. The log only
    /// changes once the reply is ready, so dropping this future midway
    /// leaves it as it was.
    pub async fn send(&mut self, query: &str) -> crate::Result<&Message> {
        if query.trim().is_empty() {
            return Err(AssistantError::EmptyQuery);
        }

        let question = Message::user(query);
        let answer = self.reconciler.reconcile(query).await;

        self.log.append(question);
        self.log.append(answer);
        let reply = &self.log.all()[self.log.len() - 1];

        info!(
            is_error = reply.is_error,
            verified = reply.attached_definition.is_some(),
            "Chat reply appended"
        );

        Ok(reply)
    }
}
