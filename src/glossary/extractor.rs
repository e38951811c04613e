//! Term extraction
//!
//! Reports every glossary key that occurs as a substring of the query.
//! There is no longest-match rule: a short acronym inside a longer
//! phrase is reported alongside the phrase.

use super::{Glossary, GlossaryEntry};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct TermExtractor {
    glossary: Arc<Glossary>,
}

impl TermExtractor {
    pub fn new(glossary: Arc<Glossary>) -> Self {
        Self { glossary }
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    /// Matching keys in canonical glossary order, no duplicates
    pub fn extract(&self, query: &str) -> Vec<String> {
        if query.is_empty() {
            return Vec::new();
        }

        let query = query.to_lowercase();

        self.glossary
            .keys()
            .filter(|key| query.contains(*key))
            .map(str::to_string)
            .collect()
    }

    /// Entry of the first extracted term, if any
    pub fn first_definition(&self, terms: &[String]) -> Option<GlossaryEntry> {
        terms
            .first()
            .and_then(|term| self.glossary.lookup(term))
            .cloned()
    }
}
