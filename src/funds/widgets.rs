//! Dashboard widgets computed from a page of funds
//!
//! Two rankings over 1-month returns, each with an optional
//! two-sentence insight from the text-generation service.

use crate::completion::{CompletionRequest, TextGenerator};
use crate::models::Fund;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;
use tokio::time::error::Elapsed;
use tracing::warn;

pub const WIDGET_SIZE: usize = 5;

pub const DEFAULT_BEST_INSIGHT: &str =
    "Analysis of top performing funds based on 1-month returns and risk metrics.";
pub const DEFAULT_DECLINE_INSIGHT: &str =
    "Funds showing the most resilience during market downturns.";

const PERFORMANCE_PROMPT: &str = "You are a financial analyst. Provide a concise 2-sentence insight about fund performance trends.";
const RESILIENCE_PROMPT: &str = "You are a financial analyst. Provide a concise 2-sentence insight about fund resilience and risk management.";

/// Higher 1-month return first
pub fn by_best_return(a: &Fund, b: &Fund) -> Ordering {
    b.return_1_month.total_cmp(&a.return_1_month)
}

/// Losses closest to zero first, then gains from smallest up
pub fn by_smallest_decline(a: &Fund, b: &Fund) -> Ordering {
    let (x, y) = (a.return_1_month, b.return_1_month);
    match (x < 0.0, y < 0.0) {
        (true, true) => y.total_cmp(&x),
        (false, false) => x.total_cmp(&y),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
    }
}

fn top(funds: &[Fund], n: usize, cmp: fn(&Fund, &Fund) -> Ordering) -> Vec<Fund> {
    let mut sorted = funds.to_vec();
    sorted.sort_by(cmp);
    sorted.truncate(n);
    sorted
}

pub fn best_performers(funds: &[Fund], n: usize) -> Vec<Fund> {
    top(funds, n, by_best_return)
}

pub fn smallest_decline(funds: &[Fund], n: usize) -> Vec<Fund> {
    top(funds, n, by_smallest_decline)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WidgetInsights {
    pub best_funds_insight: String,
    pub smallest_decline_insight: String,
}

impl Default for WidgetInsights {
    fn default() -> Self {
        Self {
            best_funds_insight: DEFAULT_BEST_INSIGHT.to_string(),
            smallest_decline_insight: DEFAULT_DECLINE_INSIGHT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalWidgets {
    pub best_funds: Vec<Fund>,
    pub smallest_decline_funds: Vec<Fund>,
    pub insights: WidgetInsights,
}

impl LocalWidgets {
    /// Rank `funds` and, when a generator is available, ask for both
    /// insights concurrently. An insight that fails or outlives `timeout`
    /// keeps its default text.
    pub async fn build(
        funds: &[Fund],
        generator: Option<&dyn TextGenerator>,
        timeout: Duration,
    ) -> Self {
        let best_funds = best_performers(funds, WIDGET_SIZE);
        let smallest_decline_funds = smallest_decline(funds, WIDGET_SIZE);
        let mut insights = WidgetInsights::default();

        if let Some(generator) = generator {
            let best_request = CompletionRequest::insight(
                PERFORMANCE_PROMPT,
                format!(
                    "Analyze these top performing funds from last month: {}. What trends do you see?",
                    describe_performance(&best_funds)
                ),
            );
            let decline_request = CompletionRequest::insight(
                RESILIENCE_PROMPT,
                format!(
                    "Analyze these funds with smallest declines: {}. What makes them resilient?",
                    describe_drawdowns(&smallest_decline_funds)
                ),
            );

            let (best, decline) = tokio::join!(
                tokio::time::timeout(timeout, generator.generate(&best_request)),
                tokio::time::timeout(timeout, generator.generate(&decline_request))
            );

            keep_insight(&mut insights.best_funds_insight, best, "Best performers");
            keep_insight(&mut insights.smallest_decline_insight, decline, "Smallest decline");
        }

        Self {
            best_funds,
            smallest_decline_funds,
            insights,
        }
    }
}

fn keep_insight(
    slot: &mut String,
    outcome: Result<crate::Result<String>, Elapsed>,
    label: &str,
) {
    match outcome {
        Ok(Ok(text)) if !text.is_empty() => *slot = text,
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!("{} insight failed: {}", label, e),
        Err(_) => warn!("{} insight timed out", label),
    }
}

fn describe_performance(funds: &[Fund]) -> String {
    funds
        .iter()
        .map(|f| {
            format!(
                "{}: {}% (1M), Sharpe: {}, Risk: {}",
                f.name, f.return_1_month, f.sharpe_ratio, f.risk_level
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_drawdowns(funds: &[Fund]) -> String {
    funds
        .iter()
        .map(|f| {
            format!(
                "{}: {}% (1M), Max Drawdown: {}%",
                f.name, f.return_1_month, f.max_drawdown
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}
