pub mod config;
pub mod error;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use error::ApiError;
use serde::{Deserialize, Serialize};
use synsearch_core::{QueryService, ScoredDocument, SearchOutcome};
use time::format_description::well_known::Rfc3339;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const NOT_FOUND_MESSAGE: &str = "No documents found matching the query";

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub processed_terms: Vec<String>,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct NotFoundResponse {
    pub query: String,
    pub processed_terms: Vec<String>,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub author: String,
    pub date: String, // YYYY-MM-DD
    pub relevance_score: i64,
    pub matched_terms: Vec<String>,
    pub matched_count: usize,
}

impl From<ScoredDocument> for SearchHit {
    fn from(s: ScoredDocument) -> Self {
        Self {
            url: s.document.url,
            title: s.document.title,
            author: s.document.author,
            date: s.document.date.to_string(),
            relevance_score: s.total_score,
            matched_terms: s.matched_terms,
            matched_count: s.matched_count,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: QueryService,
}

pub fn build_app(service: QueryService) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(|| async { "ok" }))
        .route("/api/test-db", get(test_db_handler))
        .route("/api/search", get(search_handler))
        .with_state(AppState { service })
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

// CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
fn cors_layer() -> CorsLayer {
    let any = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                any
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => any,
    }
}

async fn root_handler() -> &'static str {
    "synsearch: GET /api/search?q=<query>"
}

pub async fn search_handler(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let start = std::time::Instant::now();
    let outcome = state.service.search(params.q.as_deref()).await?;
    let response = match outcome {
        SearchOutcome::Found { query, processed_terms, results } => {
            tracing::info!(%query, hits = results.len(), took_ms = start.elapsed().as_millis() as u64, "search");
            let results = results.into_iter().map(SearchHit::from).collect();
            Json(SearchResponse { query, processed_terms, results }).into_response()
        }
        SearchOutcome::NotFound { query, processed_terms } => {
            tracing::info!(%query, hits = 0, took_ms = start.elapsed().as_millis() as u64, "search");
            (StatusCode::NOT_FOUND, Json(NotFoundResponse { query, processed_terms, message: NOT_FOUND_MESSAGE })).into_response()
        }
    };
    Ok(response)
}

/// Connectivity check: asks the store for its clock.
pub async fn test_db_handler(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let checked = match state.service.store().now().await {
        Ok(now) => now.format(&Rfc3339).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    match checked {
        Ok(now) => (StatusCode::OK, Json(serde_json::json!({ "success": true, "data": [{ "now": now }] }))),
        Err(detail) => {
            tracing::error!(%detail, "database check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "success": false, "error": "Database connection failed" })),
            )
        }
    }
}
