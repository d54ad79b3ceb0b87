//! HTTP API for `receipts serve`.
//!
//! POST /api/analyze      {image}        -> ExpenseRecord
//! POST /api/notion/sync  ExpenseRecord  -> {success, id}
//! GET  /api/health                      -> {ok, notionConfigured}

use anyhow::{Context, Result};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use receipt_core::{ExpenseRecord, sanitize_amount};
use receipt_remote::{
    ExpenseSink, Extractor, HttpExtractor, NotionClient, RateLimiter, SyncError, SyncGateway,
};

use crate::config::Config;

/// Requests without a forwarding header share one bucket.
const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<dyn Extractor>,
    pub gateway: SyncGateway,
}

impl AppState {
    /// Wire the real provider clients from configuration.
    pub fn from_config(cfg: &Config) -> Self {
        let extractor: Arc<dyn Extractor> = Arc::new(HttpExtractor::new(cfg.extractor_config()));
        let limiter = Arc::new(RateLimiter::new(
            cfg.server.rate_limit_per_minute,
            Duration::from_secs(60),
            cfg.rate_limit_ttl(),
        ));
        Self {
            extractor,
            gateway: SyncGateway::new(limiter, notion_sink(cfg)),
        }
    }
}

/// Notion sink when both credentials are present; sync is disabled otherwise.
pub fn notion_sink(cfg: &Config) -> Option<Arc<dyn ExpenseSink>> {
    match NotionClient::from_credentials(
        cfg.notion.token.as_deref(),
        cfg.notion.database_id.as_deref(),
    ) {
        Ok(client) => Some(Arc::new(client) as Arc<dyn ExpenseSink>),
        Err(SyncError::NotConfigured) => None,
        Err(e) => {
            tracing::warn!(error = %e, "notion client unavailable");
            None
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/notion/sync", post(sync))
        .route("/api/health", get(health))
        .with_state(state)
}

/// `{error}` body with a status code.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    image: Option<String>,
}

async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<ExpenseRecord>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
    let image = req
        .image
        .as_deref()
        .map(strip_data_url)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "No image provided"))?;

    match state.extractor.extract(image).await {
        Ok(record) => Ok(Json(record)),
        Err(e) => {
            tracing::error!(error = %e, "analysis failed");
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to analyze receipt: {e}"),
            ))
        }
    }
}

async fn sync(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ExpenseRecord>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let client = client_identifier(&headers);
    state
        .gateway
        .admit(&client)
        .map_err(|e| ApiError::new(StatusCode::TOO_MANY_REQUESTS, e.to_string()))?;

    let Json(mut record) =
        body.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
    record.amount = sanitize_amount(record.amount);

    match state.gateway.push(&record).await {
        Ok(id) => Ok(Json(json!({ "success": true, "id": id }))),
        Err(e) => {
            tracing::error!(error = %e, client = %client, "notion sync failed");
            Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "notionConfigured": state.gateway.is_configured(),
        "version": env!("CARGO_PKG_VERSION"),
        "build": env!("RECEIPTS_BUILD_SHA"),
    }))
}

/// First hop of `x-forwarded-for`, else "unknown".
pub fn client_identifier(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Accept both raw base64 and `data:image/...;base64,` URLs.
fn strip_data_url(image: &str) -> &str {
    let image = image.trim();
    match image.find("base64,") {
        Some(i) if image.starts_with("data:") => &image[i + "base64,".len()..],
        _ => image,
    }
}

/// Periodically drop idle rate-limit keys.
pub fn spawn_eviction(limiter: Arc<RateLimiter>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.tick().await;
        loop {
            tick.tick().await;
            limiter.evict_idle();
        }
    })
}

pub async fn serve(cfg: &Config) -> Result<()> {
    let state = AppState::from_config(cfg);
    if !state.gateway.is_configured() {
        tracing::warn!("NOTION_TOKEN / NOTION_DATABASE_ID not set; sync endpoint will fail");
    }

    let limiter = state.gateway.limiter().clone();
    let every = limiter.ttl().min(Duration::from_secs(60));
    let evictor = spawn_eviction(limiter, every);

    let listener = tokio::net::TcpListener::bind(&cfg.server.addr)
        .await
        .with_context(|| format!("bind {}", cfg.server.addr))?;
    tracing::info!(addr = %cfg.server.addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .context("http server")?;

    evictor.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::NaiveDate;
    use receipt_core::Category;
    use receipt_remote::ExtractionError;
    use serde_json::Value;
    use tower::ServiceExt;

    struct FixedExtractor;

    #[async_trait]
    impl Extractor for FixedExtractor {
        async fn extract(&self, image_base64: &str) -> Result<ExpenseRecord, ExtractionError> {
            if image_base64 == "broken" {
                return Err(ExtractionError::Unparseable("empty response".to_string()));
            }
            Ok(ExpenseRecord::new(
                "Swiggy order",
                462.35,
                Category::FoodAndDrink,
                NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
            ))
        }
    }

    struct OkSink;

    #[async_trait]
    impl ExpenseSink for OkSink {
        async fn push(&self, record: &ExpenseRecord) -> Result<String, SyncError> {
            Ok(format!("page-{}", record.amount))
        }
    }

    fn app(sink: bool, limit: usize) -> Router {
        let limiter = Arc::new(RateLimiter::new(
            limit,
            Duration::from_secs(60),
            Duration::from_secs(60),
        ));
        let sink: Option<Arc<dyn ExpenseSink>> = if sink {
            Some(Arc::new(OkSink) as Arc<dyn ExpenseSink>)
        } else {
            None
        };
        router(AppState {
            extractor: Arc::new(FixedExtractor),
            gateway: SyncGateway::new(limiter, sink),
        })
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .header("x-forwarded-for", "10.0.0.1, 172.16.0.1")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    const RECORD: &str =
        r#"{"expense":"Auto ride","amount":88.5,"category":"transport","date":"2026-01-05"}"#;

    #[tokio::test]
    async fn test_analyze_returns_record() {
        let (status, body) = call(
            app(true, 10),
            post_json("/api/analyze", r#"{"image":"data:image/png;base64,iVBOR"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["description"], "Swiggy order");
        assert_eq!(body["category"], "food&drink");
        assert_eq!(body["date"], "2026-08-29");
    }

    #[tokio::test]
    async fn test_analyze_missing_image_is_400() {
        for body in [r#"{}"#, r#"{"image":""}"#, "not json"] {
            let (status, resp) = call(app(true, 10), post_json("/api/analyze", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert!(resp["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_analyze_failure_is_500() {
        let (status, body) = call(app(true, 10), post_json("/api/analyze", r#"{"image":"broken"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("empty response"));
    }

    #[tokio::test]
    async fn test_sync_success() {
        let (status, body) = call(app(true, 10), post_json("/api/notion/sync", RECORD)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "id": "page-88.5" }));
    }

    #[tokio::test]
    async fn test_sync_rate_limited_before_body_is_read() {
        let app = app(true, 1);
        let (status, _) = call(app.clone(), post_json("/api/notion/sync", RECORD)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(app, post_json("/api/notion/sync", "garbage")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Too many requests");
    }

    #[tokio::test]
    async fn test_sync_malformed_body_is_400() {
        let (status, _) = call(app(true, 10), post_json("/api/notion/sync", r#"{"amount":1}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sync_unconfigured_is_500() {
        let (status, body) = call(app(false, 10), post_json("/api/notion/sync", RECORD)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Notion is not configured");
    }

    #[tokio::test]
    async fn test_health_reports_notion() {
        let req = Request::get("/api/health").body(Body::empty()).unwrap();
        let (status, body) = call(app(false, 10), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["notionConfigured"], false);
    }

    #[test]
    fn test_client_identifier() {
        let mut h = HeaderMap::new();
        assert_eq!(client_identifier(&h), "unknown");
        h.insert("x-forwarded-for", " 203.0.113.7 , 10.0.0.1".parse().unwrap());
        assert_eq!(client_identifier(&h), "203.0.113.7");
    }

    #[test]
    fn test_strip_data_url() {
        assert_eq!(strip_data_url("data:image/jpeg;base64,/9j/4A"), "/9j/4A");
        assert_eq!(strip_data_url(" /9j/4A "), "/9j/4A");
    }
}
