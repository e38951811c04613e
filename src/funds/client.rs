//! HTTP client for the fund data service
//!
//! Funds and widgets propagate failures. Sortable fields and widget
//! names are advisory: failures degrade to an empty list.

use crate::config::AppConfig;
use crate::error::AssistantError;
use crate::models::{Fund, FundsPage, FundsQuery, WidgetData, WidgetResponse};
use crate::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_PAGE_LIMIT: u64 = 25;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct FundsApiClient {
    client: Client,
    base_url: String,
}

impl FundsApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.funds_api_base_url, REQUEST_TIMEOUT)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| {
                AssistantError::FundsApi(format!(
                    "Unable to reach the fund service at {}: {}",
                    url, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AssistantError::FundsApi(format!(
                "{} returned {}: {}",
                path, status, error_text
            )));
        }

        let raw = response.text().await?;
        serde_json::from_str(&raw).map_err(|e| {
            AssistantError::InvalidResponse(format!("{} returned invalid JSON: {}", path, e))
        })
    }

    /// `GET /funds`
    pub async fn funds(&self, query: &FundsQuery) -> Result<FundsPage> {
        let pairs = query.query_pairs();
        info!(params = ?pairs, "Fetching funds");

        let body: Value = self.get_json("/funds", &pairs).await?;
        let page = parse_funds_page(body)?;

        info!(loaded = page.funds.len(), total = page.total, "Loaded funds");
        Ok(page)
    }

    /// `GET /sortable-fields`; empty on any failure
    pub async fn sortable_fields(&self) -> Vec<String> {
        match self.get_json::<Value>("/sortable-fields", &[]).await {
            Ok(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Ok(other) => {
                warn!("Expected array for sortable fields, got {}; using none", other);
                Vec::new()
            }
            Err(e) => {
                warn!("Sortable fields unavailable, using none: {}", e);
                Vec::new()
            }
        }
    }

    /// `GET /widgets/{id}`
    pub async fn widget(&self, widget_id: &str) -> Result<WidgetData> {
        let path = format!("/widgets/{}", widget_id);
        let response: WidgetResponse = self.get_json(&path, &[]).await?;

        match response.widget {
            Some(widget) if response.success => Ok(widget),
            _ => Err(AssistantError::InvalidResponse(
                response
                    .message
                    .unwrap_or_else(|| "Widget data is invalid".to_string()),
            )),
        }
    }

    /// Widgets generated server-side are addressed as `ai-{kind}`
    pub async fn ai_widget(&self, kind: &str) -> Result<WidgetData> {
        self.widget(&format!("ai-{}", kind)).await
    }

    pub async fn best_performing(&self) -> Result<WidgetData> {
        self.ai_widget("best-performing").await
    }

    pub async fn most_resilient(&self) -> Result<WidgetData> {
        self.ai_widget("most-resilient").await
    }

    /// `GET /widgets/generate-names`; empty on any failure
    pub async fn widget_names(&self) -> Vec<String> {
        let body = match self.get_json::<Value>("/widgets/generate-names", &[]).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Widget names unavailable: {}", e);
                return Vec::new();
            }
        };

        match body.get("names").and_then(Value::as_array) {
            Some(names) => names
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            None => {
                warn!("Widget names response has no names array");
                Vec::new()
            }
        }
    }
}

/// Accepts `{funds, pagination: {skip, limit, total}}` and the flat
/// `{funds, total, skip, limit}` shape.
pub fn parse_funds_page(body: Value) -> Result<FundsPage> {
    let funds = match body.get("funds") {
        Some(Value::Array(_)) => body["funds"].clone(),
        _ => {
            return Err(AssistantError::InvalidResponse(
                "Response does not contain a funds array".to_string(),
            ))
        }
    };
    let funds: Vec<Fund> = serde_json::from_value(funds)?;

    let non_zero = |v: Option<&Value>| v.and_then(Value::as_u64).filter(|n| *n > 0);

    let mut total = body.get("total").and_then(Value::as_u64);
    let mut skip = non_zero(body.get("skip")).unwrap_or(0);
    let mut limit = non_zero(body.get("limit")).unwrap_or(DEFAULT_PAGE_LIMIT);

    if let Some(pagination) = body.get("pagination").filter(|p| p.is_object()) {
        total = pagination.get("total").and_then(Value::as_u64);
        skip = non_zero(pagination.get("skip")).unwrap_or(skip);
        limit = non_zero(pagination.get("limit")).unwrap_or(limit);
    }

    let total = total.ok_or_else(|| {
        AssistantError::InvalidResponse("Response does not contain a valid total count".to_string())
    })?;

    Ok(FundsPage {
        funds,
        total,
        skip,
        limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::{routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn serve(router: Router) -> FundsApiClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        FundsApiClient::new(&format!("http://{}/", addr), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_parse_nested_pagination() {
        let body = json!({
            "funds": [{"id": 1, "name": "Alpha Growth"}],
            "pagination": {"skip": 25, "limit": 25, "total": 120},
            "filters_applied": {},
            "sort": {"field": "return1Year", "order": "desc"}
        });

        let page = parse_funds_page(body).unwrap();
        assert_eq!(page.funds.len(), 1);
        assert_eq!(page.total, 120);
        assert_eq!(page.skip, 25);
        assert_eq!(page.limit, 25);
    }

    #[test]
    fn test_parse_flat_shape_with_defaults() {
        let body = json!({"funds": [], "total": 0});

        let page = parse_funds_page(body).unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, 25);
    }

    #[test]
    fn test_parse_rejects_missing_funds_or_total() {
        let err = parse_funds_page(json!({"total": 3})).unwrap_err();
        assert!(matches!(err, AssistantError::InvalidResponse(_)));

        let err = parse_funds_page(json!({"funds": {}, "total": 3})).unwrap_err();
        assert!(matches!(err, AssistantError::InvalidResponse(_)));

        let err = parse_funds_page(json!({"funds": []})).unwrap_err();
        assert!(err.to_string().contains("total"));
    }

    #[tokio::test]
    async fn test_funds_sends_query_params() {
        let router = Router::new().route(
            "/funds",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({
                    "funds": [{"id": 1, "name": params.get("category").cloned().unwrap_or_default()}],
                    "total": 1,
                    "skip": params.get("skip").and_then(|s| s.parse::<u64>().ok()).unwrap_or(0),
                    "limit": 10
                }))
            }),
        );
        let client = serve(router).await;

        let query = FundsQuery {
            category: Some("Bond".into()),
            skip: Some(20),
            limit: Some(10),
            ..Default::default()
        };
        let page = client.funds(&query).await.unwrap();

        assert_eq!(page.funds[0].name, "Bond");
        assert_eq!(page.skip, 20);
        assert_eq!(page.limit, 10);
    }

    #[tokio::test]
    async fn test_funds_http_error() {
        let router = Router::new().route(
            "/funds",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let client = serve(router).await;

        let err = client.funds(&FundsQuery::default()).await.unwrap_err();
        assert!(matches!(err, AssistantError::FundsApi(_)));
    }

    #[tokio::test]
    async fn test_sortable_fields_and_fallbacks() {
        let router = Router::new().route(
            "/sortable-fields",
            get(|| async { Json(json!(["name", "aum", "return1Year"])) }),
        );
        let client = serve(router).await;
        assert_eq!(
            client.sortable_fields().await,
            vec!["name", "aum", "return1Year"]
        );

        let router = Router::new().route(
            "/sortable-fields",
            get(|| async { Json(json!({"fields": ["name"]})) }),
        );
        let client = serve(router).await;
        assert!(client.sortable_fields().await.is_empty());

        let client = serve(Router::new()).await;
        assert!(client.sortable_fields().await.is_empty());
    }

    #[tokio::test]
    async fn test_widget_success_and_rejection() {
        let router = Router::new().route(
            "/widgets/:id",
            get(|Path(id): Path<String>| async move {
                if id == "ai-best-performing" {
                    Json(json!({
                        "success": true,
                        "widget": {
                            "id": id,
                            "title": "Top Performers",
                            "description": "Best 1M returns",
                            "funds": [{"id": 3, "name": "Momentum"}],
                            "metadata": {"period": "1M", "aiReasoning": "ranked by return"}
                        }
                    }))
                } else {
                    Json(json!({"success": false, "message": "unknown widget"}))
                }
            }),
        );
        let client = serve(router).await;

        let widget = client.best_performing().await.unwrap();
        assert_eq!(widget.title, "Top Performers");
        assert_eq!(widget.funds.len(), 1);
        assert_eq!(
            widget.metadata.unwrap().ai_reasoning.as_deref(),
            Some("ranked by return")
        );

        let err = client.most_resilient().await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid response: unknown widget");
    }

    #[tokio::test]
    async fn test_widget_names_swallow_failures() {
        let router = Router::new().route(
            "/widgets/generate-names",
            get(|| async { Json(json!({"names": ["Steady Eddies", "Rocket Funds"]})) }),
        );
        let client = serve(router).await;
        assert_eq!(client.widget_names().await, vec!["Steady Eddies", "Rocket Funds"]);

        let router = Router::new().route(
            "/widgets/generate-names",
            get(|| async { (StatusCode::BAD_GATEWAY, "down") }),
        );
        let client = serve(router).await;
        assert!(client.widget_names().await.is_empty());
    }
}
