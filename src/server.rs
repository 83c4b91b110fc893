//! HTTP front end for the search engine.
//!
//! The engine is built once before the listener is bound and handed to every
//! handler as shared, read-only state.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/search?q=<query>&existing=<n>` | Next page of snippets as a JSON array of strings |
//! | `GET`  | `/health` | Health check (returns version and corpus size) |
//! | `GET`  | `/*` | Static front-end assets |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "missing_query", "message": "missing search query in URL params" } }
//! ```
//!
//! Error codes: `malformed_query` (400), `missing_query` (400),
//! `malformed_existing` (400), `invalid_query` (400), `internal` (500).
//!
//! A repeated parameter takes its first value.
//!
//! # Blocking work
//!
//! A broad regex scans the whole corpus, so each search runs on Tokio's
//! blocking pool rather than on an async worker.

use anyhow::Context;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::{EngineError, SearchEngine};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    engine: Arc<SearchEngine>,
}

/// Loads the corpus named in the config, indexes it, and serves it until the
/// process is terminated.
///
/// A corpus that cannot be read aborts startup before anything is bound.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let corpus_path = config.corpus.path.clone();
    let options = config.search.options();

    let engine = tokio::task::spawn_blocking(move || SearchEngine::load(&corpus_path, options))
        .await
        .context("index build task failed")??;

    serve(Arc::new(engine), config).await
}

/// Serves an already-built engine on the configured address.
pub async fn serve(engine: Arc<SearchEngine>, config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind_addr()?;
    let app = router(engine, &config.server.static_dir);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!(addr = %bind_addr, "shakesearch available");
    println!("shakesearch available at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the application router around `engine`.
pub fn router(engine: Arc<SearchEngine>, static_dir: &Path) -> Router {
    let state = AppState { engine };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", get(handle_search))
        .route("/health", get(handle_health))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"missing_query"`).
    code: &'static str,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(code: &'static str, message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code,
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidQuery(_) => bad_request("invalid_query", err.to_string()),
            // Not produced by `search`; keep the corpus path out of responses.
            EngineError::Load { .. } => internal("corpus unavailable"),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    corpus_bytes: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        corpus_bytes: state.engine.corpus().len(),
    })
}

// ============ GET /search ============

/// First value of `name` in the decoded query string.
fn first_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Handler for `GET /search`.
///
/// Returns the snippets for matches `existing .. existing + page size` as a
/// JSON array of strings. An exhausted query yields `[]`.
async fn handle_search(
    State(state): State<AppState>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params.map_err(|e| bad_request("malformed_query", e.body_text()))?;

    let query = first_param(&params, "q")
        .filter(|q| !q.is_empty())
        .ok_or_else(|| bad_request("missing_query", "missing search query in URL params"))?
        .to_string();

    let existing = match first_param(&params, "existing") {
        None => 0,
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            bad_request(
                "malformed_existing",
                "expecting existing to be parseable into a non-negative integer",
            )
        })?,
    };

    let engine = state.engine.clone();
    tokio::task::spawn_blocking(move || {
        engine
            .search(&query, existing)
            .map(|snippets| Json(snippets).into_response())
            .map_err(|e| {
                warn!(query = %query, error = %e, "search rejected");
                AppError::from(e)
            })
    })
    .await
    .map_err(|e| internal(format!("search task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_app() -> (TempDir, Router) {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("index.html"),
            "<html><body>shakesearch</body></html>",
        )
        .unwrap();

        let corpus: String = (0..25)
            .map(|i| format!("Scene {i}. Enter a drunk porter.\n"))
            .collect();
        let engine = Arc::new(SearchEngine::from_text(corpus));
        let app = router(engine, tmp.path());
        (tmp, app)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_search_returns_json_array() {
        let (_tmp, app) = test_app();
        let (status, body) = get_json(app, "/search?q=drunk").await;

        assert_eq!(status, StatusCode::OK);
        let results = body.as_array().unwrap();
        assert_eq!(results.len(), 20);
        assert!(results.iter().all(|r| r.as_str().unwrap().contains("drunk")));
    }

    #[tokio::test]
    async fn test_search_with_existing() {
        let (_tmp, app) = test_app();
        let (status, body) = get_json(app.clone(), "/search?q=DRUNK&existing=20").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 5);

        let (status, body) = get_json(app, "/search?q=drunk&existing=25").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_missing_query() {
        let (_tmp, app) = test_app();
        for uri in ["/search", "/search?q=", "/search?existing=3"] {
            let (status, body) = get_json(app.clone(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "uri {}", uri);
            assert_eq!(body["error"]["code"], "missing_query");
        }
    }

    #[tokio::test]
    async fn test_malformed_existing() {
        let (_tmp, app) = test_app();
        for uri in [
            "/search?q=drunk&existing=abc",
            "/search?q=drunk&existing=-1",
            "/search?q=drunk&existing=",
        ] {
            let (status, body) = get_json(app.clone(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "uri {}", uri);
            assert_eq!(body["error"]["code"], "malformed_existing");
        }
    }

    #[tokio::test]
    async fn test_repeated_params_take_first_value() {
        let (_tmp, app) = test_app();
        let (status, body) = get_json(app.clone(), "/search?q=drunk&existing=20&existing=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 5);

        let (status, body) = get_json(app, "/search?q=porter&q=%28unclosed").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_concurrent_searches_share_engine() {
        let (_tmp, app) = test_app();
        let (a, b, c) = tokio::join!(
            get_json(app.clone(), "/search?q=drunk"),
            get_json(app.clone(), "/search?q=dr.nk&existing=20"),
            get_json(app, "/search?q=scene%20%5Cd%2B"),
        );
        assert_eq!(a.1.as_array().unwrap().len(), 20);
        assert_eq!(b.1.as_array().unwrap().len(), 5);
        assert_eq!(c.1.as_array().unwrap().len(), 20);
    }

    #[test]
    fn test_first_param() {
        let params = vec![
            ("q".to_string(), "hamlet".to_string()),
            ("existing".to_string(), "20".to_string()),
            ("q".to_string(), "ophelia".to_string()),
        ];
        assert_eq!(first_param(&params, "q"), Some("hamlet"));
        assert_eq!(first_param(&params, "existing"), Some("20"));
        assert_eq!(first_param(&params, "missing"), None);
    }

    #[tokio::test]
    async fn test_invalid_regex_is_client_error() {
        let (_tmp, app) = test_app();
        let (status, body) = get_json(app, "/search?q=%28unclosed").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_query");
    }

    #[tokio::test]
    async fn test_health() {
        let (_tmp, app) = test_app();
        let (status, body) = get_json(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["corpus_bytes"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_static_index_served_at_root() {
        let (_tmp, app) = test_app();
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("shakesearch"));
    }
}
