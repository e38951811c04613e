//! REST API Server for the fund terminology assistant
//!
//! Exposes chat sessions, the verified glossary and a pass-through to
//! the fund data service for the dashboard frontend.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::completion::TextGenerator;
use crate::conversational::SUGGESTED_QUERIES;
use crate::error::AssistantError;
use crate::funds::{FundsApiClient, FundsTable, LocalWidgets};
use crate::memory::SessionStore;
use crate::models::{FundsQuery, SortOrder};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: String,
}

/// Table view over `/funds`: page index, page size, search and sort
#[derive(Debug, Default, Deserialize)]
pub struct TableView {
    pub page: Option<u32>,
    pub rows: Option<u32>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(data: T) -> ApiResult {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn fail(error: AssistantError) -> ApiResult {
    let status = match &error {
        AssistantError::EmptyQuery => StatusCode::BAD_REQUEST,
        AssistantError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        AssistantError::FundsApi(_)
        | AssistantError::InvalidResponse(_)
        | AssistantError::Http(_)
        | AssistantError::Serialization(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::error(error.to_string())))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub sessions: Arc<SessionStore>,
    pub funds: FundsApiClient,
    pub generator: Option<Arc<dyn TextGenerator>>,
}

/// =============================
/// Helpers: Session Ids
/// =============================

fn stable_uuid_from_string(input: &str) -> uuid::Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    uuid::Uuid::from_bytes(bytes)
}

/// Client ids may be any string; non-UUIDs map to a stable UUID
pub fn session_uuid(value: &str) -> uuid::Uuid {
    uuid::Uuid::parse_str(value.trim()).unwrap_or_else(|_| stable_uuid_from_string(value.trim()))
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoints
/// =============================

async fn chat_handler(State(state): State<ApiState>, Json(req): Json<ChatRequest>) -> ApiResult {
    if req.message.trim().is_empty() {
        return fail(AssistantError::EmptyQuery);
    }

    let session_id = match req.session_id.as_deref() {
        Some(v) if !v.trim().is_empty() => session_uuid(v),
        _ => uuid::Uuid::new_v4(),
    };

    info!(%session_id, "Received chat message");

    let session = state.sessions.get_or_create(session_id).await;
    let mut session = session.lock().await;

    let reply = match session.send(&req.message).await {
        Ok(reply) => reply.clone(),
        Err(e) => return fail(e),
    };

    ok(serde_json::json!({
        "session_id": session_id.to_string(),
        "reply": reply,
        "message_count": session.log().len(),
    }))
}

async fn chat_messages(State(state): State<ApiState>, Path(session_id): Path<String>) -> ApiResult {
    let Some(session) = state.sessions.get(session_uuid(&session_id)).await else {
        return fail(AssistantError::SessionNotFound(session_id));
    };

    let session = session.lock().await;
    ok(session.log().all())
}

async fn end_chat(State(state): State<ApiState>, Path(session_id): Path<String>) -> ApiResult {
    if state.sessions.remove(session_uuid(&session_id)).await {
        ok(serde_json::json!({ "session_id": session_id }))
    } else {
        fail(AssistantError::SessionNotFound(session_id))
    }
}

async fn suggestions(State(state): State<ApiState>) -> ApiResult {
    ok(serde_json::json!({
        "queries": SUGGESTED_QUERIES,
        "ai_enabled": state.sessions.reconciler().is_configured(),
    }))
}

/// =============================
/// Glossary Endpoints
/// =============================

async fn glossary(State(state): State<ApiState>) -> ApiResult {
    let entries: Vec<serde_json::Value> = state
        .sessions
        .reconciler()
        .glossary()
        .entries()
        .map(|(key, entry)| {
            serde_json::json!({
                "key": key,
                "term": entry.term,
                "definition": entry.definition,
                "category": entry.category,
            })
        })
        .collect();
    ok(entries)
}

async fn glossary_term(State(state): State<ApiState>, Path(term): Path<String>) -> ApiResult {
    match state.sessions.reconciler().glossary().lookup(&term) {
        Some(entry) => ok(entry),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("No verified definition for '{}'", term))),
        ),
    }
}

/// =============================
/// Fund Service Pass-through
/// =============================

async fn funds(State(state): State<ApiState>, Query(query): Query<FundsQuery>) -> ApiResult {
    match state.funds.funds(&query).await {
        Ok(page) => ok(page),
        Err(e) => fail(e),
    }
}

async fn funds_table(
    State(state): State<ApiState>,
    Query(filters): Query<FundsQuery>,
    Query(view): Query<TableView>,
) -> ApiResult {
    let sortable = state.funds.sortable_fields().await;

    let mut table = FundsTable::new();
    table.set_filters(filters);
    if let Some(search) = &view.search {
        table.set_search(search);
    }
    if let Some(rows) = view.rows {
        table.set_rows_per_page(rows);
    }
    if let Some(field) = &view.sort {
        table.set_sort(field, view.order.unwrap_or_default(), &sortable);
    }
    table.set_page(view.page.unwrap_or(0));

    let page = match state.funds.funds(&table.query()).await {
        Ok(page) => page,
        Err(e) => return fail(e),
    };

    let (sort_by, sort_order) = table.sort();
    ok(serde_json::json!({
        "funds": page.funds,
        "total": page.total,
        "page": table.page(),
        "rows_per_page": table.rows_per_page(),
        "last_page": table.last_page(page.total),
        "sort_by": sort_by,
        "sort_order": sort_order,
        "sortable_fields": sortable,
    }))
}

async fn sortable_fields(State(state): State<ApiState>) -> ApiResult {
    ok(state.funds.sortable_fields().await)
}

async fn widget(State(state): State<ApiState>, Path(widget_id): Path<String>) -> ApiResult {
    match state.funds.widget(&widget_id).await {
        Ok(widget) => ok(widget),
        Err(e) => fail(e),
    }
}

async fn ai_widget(State(state): State<ApiState>, Path(kind): Path<String>) -> ApiResult {
    match state.funds.ai_widget(&kind).await {
        Ok(widget) => ok(widget),
        Err(e) => fail(e),
    }
}

async fn best_performing(State(state): State<ApiState>) -> ApiResult {
    match state.funds.best_performing().await {
        Ok(widget) => ok(widget),
        Err(e) => fail(e),
    }
}

async fn most_resilient(State(state): State<ApiState>) -> ApiResult {
    match state.funds.most_resilient().await {
        Ok(widget) => ok(widget),
        Err(e) => fail(e),
    }
}

async fn local_widgets(State(state): State<ApiState>, Query(query): Query<FundsQuery>) -> ApiResult {
    let page = match state.funds.funds(&query).await {
        Ok(page) => page,
        Err(e) => return fail(e),
    };

    let timeout = state.sessions.reconciler().timeout();
    let widgets = LocalWidgets::build(&page.funds, state.generator.as_deref(), timeout).await;
    ok(widgets)
}

async fn widget_names(State(state): State<ApiState>) -> ApiResult {
    ok(serde_json::json!({ "names": state.funds.widget_names().await }))
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/suggestions", get(suggestions))
        .route("/api/chat/:session_id", axum::routing::delete(end_chat))
        .route("/api/chat/:session_id/messages", get(chat_messages))
        .route("/api/glossary", get(glossary))
        .route("/api/glossary/:term", get(glossary_term))
        .route("/api/funds", get(funds))
        .route("/api/funds/table", get(funds_table))
        .route("/api/sortable-fields", get(sortable_fields))
        .route("/api/widgets/local", get(local_widgets))
        .route("/api/widgets/best-performing", get(best_performing))
        .route("/api/widgets/most-resilient", get(most_resilient))
        .route("/api/widgets/ai/:kind", get(ai_widget))
        .route("/api/widgets/:widget_id", get(widget))
        .route("/api/widget-names", get(widget_names))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionRequest;
    use crate::glossary::Glossary;
    use crate::reconciler::AnswerReconciler;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    struct Canned;

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, request: &CompletionRequest) -> crate::Result<String> {
            Ok(format!("model says: {}", request.user_query))
        }
    }

    fn state_with_funds(base_url: &str) -> ApiState {
        let generator: Arc<dyn TextGenerator> = Arc::new(Canned);
        let reconciler = AnswerReconciler::new(Glossary::builtin(), Some(Arc::clone(&generator)));
        ApiState {
            sessions: Arc::new(SessionStore::new(Arc::new(reconciler))),
            funds: FundsApiClient::new(base_url, Duration::from_secs(2)).unwrap(),
            generator: Some(generator),
        }
    }

    fn state() -> ApiState {
        state_with_funds("http://127.0.0.1:9")
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_session_uuid_is_stable() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(session_uuid(&id.to_string()), id);
        assert_eq!(session_uuid("browser-tab-1"), session_uuid("browser-tab-1"));
        assert_ne!(session_uuid("browser-tab-1"), session_uuid("browser-tab-2"));
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(create_router(state()), get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let router = create_router(state());

        let (status, body) = call(
            router.clone(),
            post_json("/api/chat", json!({"session_id": "tab-1", "message": "What is ESG?"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["reply"]["text"], "model says: What is ESG?");
        assert_eq!(data["reply"]["matched_terms"], json!(["esg"]));
        assert_eq!(data["reply"]["attached_definition"]["term"], "ESG");
        assert_eq!(data["message_count"], 3);

        let (status, body) = call(router, get_req("/api/chat/tab-1/messages")).await;
        assert_eq!(status, StatusCode::OK);
        let roles: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["bot", "user", "bot"]);
    }

    #[tokio::test]
    async fn test_chat_rejects_blank_message() {
        let state = state();
        let (status, body) = call(
            create_router(state.clone()),
            post_json("/api/chat", json!({"message": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(state.sessions.len().await, 0);
    }

    #[tokio::test]
    async fn test_anonymous_chats_stay_within_capacity() {
        let generator: Arc<dyn TextGenerator> = Arc::new(Canned);
        let reconciler = AnswerReconciler::new(Glossary::builtin(), Some(generator));
        let state = ApiState {
            sessions: Arc::new(
                SessionStore::new(Arc::new(reconciler)).with_limits(Duration::from_secs(3600), 2),
            ),
            ..state()
        };
        let router = create_router(state.clone());

        for _ in 0..3 {
            let (status, _) =
                call(router.clone(), post_json("/api/chat", json!({"message": "What is AUM?"}))).await;
            assert_eq!(status, StatusCode::OK);
        }
        assert_eq!(state.sessions.len().await, 2);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let router = create_router(state());
        let (status, _) = call(router.clone(), get_req("/api/chat/nobody/messages")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/chat/nobody")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(router, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_glossary_endpoints() {
        let router = create_router(state());

        let (status, body) = call(router.clone(), get_req("/api/glossary")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["key"], "esg");
        assert_eq!(body["data"].as_array().unwrap().len(), 8);

        let (status, body) = call(router.clone(), get_req("/api/glossary/Volatility")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["category"], "Risk Management");

        let (status, _) = call(router, get_req("/api/glossary/weather")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_suggestions() {
        let (status, body) = call(create_router(state()), get_req("/api/chat/suggestions")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["queries"].as_array().unwrap().len(), 6);
        assert_eq!(body["data"]["ai_enabled"], true);
    }

    #[tokio::test]
    async fn test_funds_pass_through_and_local_widgets() {
        let backend = Router::new().route(
            "/funds",
            get(|| async {
                Json(json!({
                    "funds": [
                        {"id": 1, "name": "Up", "return1Month": 3.0},
                        {"id": 2, "name": "Down", "return1Month": -1.0}
                    ],
                    "pagination": {"skip": 0, "limit": 25, "total": 2}
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, backend).await.unwrap();
        });

        let router = create_router(state_with_funds(&format!("http://{}", addr)));

        let (status, body) = call(router.clone(), get_req("/api/funds?category=Equity&limit=25")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 2);

        let (status, body) = call(router, get_req("/api/widgets/local")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["best_funds"][0]["name"], "Up");
        assert_eq!(body["data"]["smallest_decline_funds"][0]["name"], "Down");
    }

    #[tokio::test]
    async fn test_funds_service_down_is_bad_gateway() {
        let (status, body) = call(create_router(state()), get_req("/api/funds")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);

        let (status, body) = call(create_router(state()), get_req("/api/sortable-fields")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_funds_table_view_and_ai_widgets() {
        use std::collections::HashMap;

        let backend = Router::new()
            .route(
                "/funds",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let expected = [
                        ("category", "Equity"),
                        ("manager", "Vanguard"),
                        ("sort_by", "aum"),
                        ("sort_order", "asc"),
                        ("skip", "30"),
                        ("limit", "10"),
                    ];
                    for (key, value) in expected {
                        assert_eq!(params.get(key).map(String::as_str), Some(value), "{}", key);
                    }
                    Json(json!({"funds": [{"id": 7, "name": "Index"}], "total": 95, "skip": 30, "limit": 10}))
                }),
            )
            .route("/sortable-fields", get(|| async { Json(json!(["name", "aum"])) }))
            .route(
                "/widgets/:id",
                get(|Path(id): Path<String>| async move {
                    if id.starts_with("ai-") {
                        Json(json!({"success": true, "widget": {"id": id, "title": id, "description": "", "funds": []}}))
                    } else {
                        Json(json!({"success": false, "message": "unknown widget"}))
                    }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, backend).await.unwrap();
        });

        let router = create_router(state_with_funds(&format!("http://{}", addr)));

        let (status, body) = call(
            router.clone(),
            get_req("/api/funds/table?category=Equity&search=Vanguard&sort=aum&order=asc&rows=10&page=3"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["funds"][0]["name"], "Index");
        assert_eq!(data["page"], 3);
        assert_eq!(data["last_page"], 9);
        assert_eq!(data["sort_by"], "aum");
        assert_eq!(data["sort_order"], "asc");
        assert_eq!(data["sortable_fields"], json!(["name", "aum"]));

        let (status, body) = call(router.clone(), get_req("/api/widgets/best-performing")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], "ai-best-performing");

        let (status, body) = call(router.clone(), get_req("/api/widgets/ai/most-resilient")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], "ai-most-resilient");

        let (status, _) = call(router, get_req("/api/widgets/top-ten")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
