//! Answer reconciliation
//!
//! Turns one user query into exactly one bot message:
//! EXTRACT → AWAIT ANSWER → FINALIZE
//!
//! Glossary matches are attached whatever the collaborator does. Every
//! collaborator failure becomes an error message; nothing escapes.

use crate::completion::{CompletionRequest, TextGenerator};
use crate::config::DEFAULT_COMPLETION_TIMEOUT_SECS;
use crate::glossary::{Glossary, TermExtractor};
use crate::memory::{ConversationLog, Message};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub const UNCONFIGURED_TEXT: &str = "I need a Groq API key to provide AI-powered responses. Please set up your GROQ_API_KEY environment variable. However, I can still help with verified definitions!";
pub const FAILURE_TEXT: &str =
    "Sorry, I encountered an error. Please check your API key or try again later.";
pub const EMPTY_ANSWER_TEXT: &str = "Sorry, I couldn't generate a response.";

/// Outcome of the external call, before it becomes a message
#[derive(Debug, Clone, PartialEq, Eq)]
enum Answer {
    Generated(String),
    Unconfigured,
    Failed,
}

pub struct AnswerReconciler {
    extractor: TermExtractor,
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl AnswerReconciler {
    pub fn new(glossary: Arc<Glossary>, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            extractor: TermExtractor::new(glossary),
            generator,
            timeout: Duration::from_secs(DEFAULT_COMPLETION_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bound on one text-generation call
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn extractor(&self) -> &TermExtractor {
        &self.extractor
    }

    pub fn glossary(&self) -> &Glossary {
        self.extractor.glossary()
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// Build the bot message for `query`. Never fails.
    pub async fn reconcile(&self, query: &str) -> Message {
        let matched_terms = self.extractor.extract(query);
        let attached_definition = self.extractor.first_definition(&matched_terms);

        info!(
            terms = ?matched_terms,
            verified = attached_definition.is_some(),
            "Reconciling query"
        );

        let (text, is_error) = match self.await_answer(query).await {
            Answer::Generated(text) if text.is_empty() => {
                (EMPTY_ANSWER_TEXT.to_string(), false)
            }
            Answer::Generated(text) => (text, false),
            Answer::Unconfigured => (UNCONFIGURED_TEXT.to_string(), false),
            Answer::Failed => (FAILURE_TEXT.to_string(), true),
        };

        Message::bot(text, matched_terms, attached_definition, is_error)
    }

    /// Reconcile and append exactly one bot message to `log`
    pub async fn reconcile_into<'a>(&self, log: &'a mut ConversationLog, query: &str) -> &'a Message {
        let message = self.reconcile(query).await;
        log.append(message);
        &log.all()[log.len() - 1]
    }

    async fn await_answer(&self, query: &str) -> Answer {
        let Some(generator) = &self.generator else {
            warn!("No text-generation service configured, answering from glossary only");
            return Answer::Unconfigured;
        };

        let request = CompletionRequest::terminology(query);

        let outcome = tokio::time::timeout(self.timeout, generator.generate(&request)).await;

        match outcome {
            Ok(Ok(text)) => Answer::Generated(text),
            Ok(Err(e)) => {
                error!("Text generation failed: {}", e);
                Answer::Failed
            }
            Err(_) => {
                error!(
                    "Text generation timed out after {}s",
                    self.timeout.as_secs()
                );
                Answer::Failed
            }
        }
    }
}
