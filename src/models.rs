//! Fund data models shared with the fund data service

use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    #[serde(rename = "Medium-High")]
    MediumHigh,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

//
// ================= Fund =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Fund {
    pub id: u64,
    pub name: String,
    pub aum: String,
    #[serde(rename = "return1Month")]
    pub return_1_month: f64,
    #[serde(rename = "return3Month")]
    pub return_3_month: f64,
    #[serde(rename = "return1Year")]
    pub return_1_year: f64,
    #[serde(rename = "return3Year")]
    pub return_3_year: f64,
    #[serde(rename = "return5Year")]
    pub return_5_year: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub risk_level: RiskLevel,
    pub category: String,
    pub geography: String,
    pub esg_score: f64,
    pub alpha: f64,
    pub beta: f64,
    pub manager: String,
    pub inception_date: String,
    pub morningstar_rating: u8,
    pub expense_ratio: f64,
    pub minimum_investment: f64,
    pub dividend_yield: f64,
    pub turnover_ratio: f64,
    pub nav: f64,
    pub total_assets: f64,
    pub pe_ratio: f64,
    pub pb_ratio: f64,
    pub is_active: bool,
    pub is_sustainable: bool,
    pub currency: String,
    pub domicile: String,
    pub information_ratio: f64,
    pub tracking_error: f64,
    pub uptrend_capture: f64,
    pub downtrend_capture: f64,
}

//
// ================= Query =================
//

/// Filters, sort and pagination for `GET /funds`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundsQuery {
    pub category: Option<String>,
    pub geography: Option<String>,
    pub risk_level: Option<String>,
    pub manager: Option<String>,
    #[serde(rename = "minReturn1Year")]
    pub min_return_1_year: Option<f64>,
    #[serde(rename = "maxReturn1Year")]
    pub max_return_1_year: Option<f64>,
    pub min_esg_score: Option<f64>,
    pub max_esg_score: Option<f64>,
    pub min_sharpe_ratio: Option<f64>,
    pub max_sharpe_ratio: Option<f64>,
    pub min_volatility: Option<f64>,
    pub max_volatility: Option<f64>,
    pub morningstar_rating: Option<u8>,
    pub is_active: Option<bool>,
    pub is_sustainable: Option<bool>,
    pub currency: Option<String>,
    #[serde(rename = "sort_by")]
    pub sort_by: Option<String>,
    #[serde(rename = "sort_order")]
    pub sort_order: Option<SortOrder>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl FundsQuery {
    /// Wire query pairs; unset and empty values are left out
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                pairs.push((key, value));
            }
        };

        push("category", self.category.clone());
        push("geography", self.geography.clone());
        push("riskLevel", self.risk_level.clone());
        push("manager", self.manager.clone());
        push("minReturn1Year", self.min_return_1_year.map(|v| v.to_string()));
        push("maxReturn1Year", self.max_return_1_year.map(|v| v.to_string()));
        push("minEsgScore", self.min_esg_score.map(|v| v.to_string()));
        push("maxEsgScore", self.max_esg_score.map(|v| v.to_string()));
        push("minSharpeRatio", self.min_sharpe_ratio.map(|v| v.to_string()));
        push("maxSharpeRatio", self.max_sharpe_ratio.map(|v| v.to_string()));
        push("minVolatility", self.min_volatility.map(|v| v.to_string()));
        push("maxVolatility", self.max_volatility.map(|v| v.to_string()));
        push("morningstarRating", self.morningstar_rating.map(|v| v.to_string()));
        push("isActive", self.is_active.map(|v| v.to_string()));
        push("isSustainable", self.is_sustainable.map(|v| v.to_string()));
        push("currency", self.currency.clone());
        push("sort_by", self.sort_by.clone());
        push("sort_order", self.sort_order.map(|o| o.to_string()));
        push("skip", self.skip.map(|v| v.to_string()));
        push("limit", self.limit.map(|v| v.to_string()));

        pairs
    }
}

//
// ================= Responses =================
//

/// One page of funds, normalized from either response shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FundsPage {
    pub funds: Vec<Fund>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WidgetMetadata {
    pub period: Option<String>,
    pub criteria: Option<String>,
    pub last_updated: Option<String>,
    pub ai_generated_params: Option<FundsQuery>,
    pub ai_reasoning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WidgetData {
    pub id: String,
    pub title: String,
    pub description: String,
    pub funds: Vec<Fund>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<WidgetMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WidgetResponse {
    pub success: bool,
    pub widget: Option<WidgetData>,
    pub message: Option<String>,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::MediumHigh => "Medium-High",
            RiskLevel::High => "High",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        };
        write!(f, "{}", s)
    }
}
