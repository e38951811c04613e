//! Verified fund terminology
//!
//! An immutable map from a normalized lookup key to a verified
//! definition. Keys keep the order in which they were defined; that
//! order is the canonical order for term extraction.

use crate::Result;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub mod extractor;
pub use extractor::TermExtractor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: String,
    pub category: String,
}

/// (key, term, category, definition)
const BUILTIN_DEFINITIONS: &[(&str, &str, &str, &str)] = &[
    (
        "esg",
        "ESG",
        "Sustainability",
        "Environmental, Social, and Governance. A framework used to evaluate a company's sustainability and ethical impact. Environmental factors include climate change and resource usage. Social factors cover labor practices and community relations. Governance involves board structure and executive compensation.",
    ),
    (
        "alpha",
        "Alpha",
        "Performance",
        "A measure of investment performance that indicates how much a security or portfolio has earned compared to a benchmark index. Positive alpha indicates outperformance, while negative alpha indicates underperformance.",
    ),
    (
        "sharpe ratio",
        "Sharpe Ratio",
        "Risk Management",
        "A risk-adjusted measure of return that calculates excess return per unit of risk. It's calculated as (Return - Risk-free rate) / Standard deviation. Higher Sharpe ratios indicate better risk-adjusted performance.",
    ),
    (
        "aum",
        "AUM (Assets Under Management)",
        "Metrics",
        "The total market value of assets that an investment company or financial institution manages on behalf of clients. It's a key metric for measuring the size and success of investment firms.",
    ),
    (
        "private equity",
        "Private Equity",
        "Asset Classes",
        "Investment in companies that are not publicly traded. Private equity firms typically buy companies, improve operations, and sell them for a profit. Common strategies include buyouts, growth capital, and distressed investing.",
    ),
    (
        "volatility",
        "Volatility",
        "Risk Management",
        "A statistical measure of the dispersion of returns for a security or market index. Higher volatility indicates greater price swings and risk, while lower volatility suggests more stable returns.",
    ),
    (
        "drawdown",
        "Drawdown",
        "Risk Management",
        "The peak-to-trough decline during a specific period for an investment or portfolio. Maximum drawdown represents the largest loss from a peak to a trough. It's a key measure of downside risk.",
    ),
    (
        "reit",
        "REIT (Real Estate Investment Trust)",
        "Asset Classes",
        "A company that owns, operates, or finances income-generating real estate. REITs provide investors a way to earn a share of income from real estate investments without having to buy properties directly.",
    ),
];

lazy_static! {
    static ref BUILTIN_GLOSSARY: Arc<Glossary> = Arc::new(Glossary::from_entries(
        BUILTIN_DEFINITIONS
            .iter()
            .map(|(key, term, category, definition)| {
                (
                    key.to_string(),
                    GlossaryEntry {
                        term: term.to_string(),
                        definition: definition.to_string(),
                        category: category.to_string(),
                    },
                )
            })
    ));
}

/// Lower-case, trimmed lookup key
pub fn normalize_key(term: &str) -> String {
    term.trim().to_lowercase()
}

/// One entry of a glossary file. `key` defaults to the normalized term.
#[derive(Debug, Deserialize)]
struct GlossaryFileEntry {
    key: Option<String>,
    term: String,
    definition: String,
    category: String,
}

#[derive(Debug, Clone, Default)]
pub struct Glossary {
    /// Canonical order
    keys: Vec<String>,
    entries: HashMap<String, GlossaryEntry>,
}

impl Glossary {
    /// The verified terminology shipped with the assistant
    pub fn builtin() -> Arc<Glossary> {
        Arc::clone(&BUILTIN_GLOSSARY)
    }

    /// Build from `(key, entry)` pairs. A repeated key replaces the
    /// earlier definition but keeps its original position.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, GlossaryEntry)>,
    {
        let mut glossary = Self::default();
        glossary.extend(entries);
        glossary
    }

    fn extend<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, GlossaryEntry)>,
    {
        for (key, entry) in entries {
            let key = normalize_key(&key);
            if key.is_empty() {
                continue;
            }
            if self.entries.insert(key.clone(), entry).is_none() {
                self.keys.push(key);
            }
        }
    }

    /// Built-in glossary extended with a JSON array of
    /// `{key?, term, definition, category}` objects.
    pub fn builtin_with_json(json: &str) -> Result<Glossary> {
        let file_entries: Vec<GlossaryFileEntry> = serde_json::from_str(json)?;

        let mut glossary = (*Self::builtin()).clone();
        glossary.extend(file_entries.into_iter().map(|e| {
            let key = e.key.unwrap_or_else(|| e.term.clone());
            (
                key,
                GlossaryEntry {
                    term: e.term,
                    definition: e.definition,
                    category: e.category,
                },
            )
        }));

        Ok(glossary)
    }

    /// Startup loader: the built-in glossary, optionally extended from a file
    pub fn load(path: Option<&Path>) -> Result<Arc<Glossary>> {
        let Some(path) = path else {
            return Ok(Self::builtin());
        };

        let json = std::fs::read_to_string(path)?;
        let glossary = Self::builtin_with_json(&json)?;

        info!(
            path = %path.display(),
            terms = glossary.len(),
            "Loaded glossary extensions"
        );

        Ok(Arc::new(glossary))
    }

    /// Normalized lookup; `None` is a valid outcome
    pub fn lookup(&self, term: &str) -> Option<&GlossaryEntry> {
        self.entries.get(&normalize_key(term))
    }

    /// Keys in canonical order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// `(key, entry)` in canonical order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &GlossaryEntry)> {
        self.keys
            .iter()
            .filter_map(move |k| self.entries.get(k).map(|e| (k.as_str(), e)))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
