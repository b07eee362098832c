use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use synsearch_core::error::StoreResult;
use synsearch_core::persist::{save_snapshot, SnapshotPaths};
use synsearch_core::{Document, IndexStore, MemoryStore, QueryService, ScoredDocument, StoreError, TermId};
use synsearch_server::build_app;
use synsearch_server::config::{Backend, Store};
use tempfile::tempdir;
use time::macros::date;
use time::OffsetDateTime;
use tower::ServiceExt;

fn build_tiny_index() -> MemoryStore {
    let store = MemoryStore::new();
    let rust = store.insert_term("rust");
    let ferris = store.insert_term("ferris");
    let crab = store.insert_term("crab");
    store.insert_synonym("rust", "ferris").unwrap();
    store.insert_synonym("crustacean", "crab").unwrap();

    store.insert_document(Document {
        id: 1,
        url: "https://example.org/book".into(),
        title: "The Book".into(),
        author: "Steve".into(),
        date: date!(2018 - 05 - 10),
    });
    store.insert_document(Document {
        id: 2,
        url: "https://example.org/ferris".into(),
        title: "Meet Ferris".into(),
        author: "Karen".into(),
        date: date!(2021 - 09 - 01),
    });

    // doc 1: rust=3; doc 2: rust=1 + ferris=2, same score but two matched terms
    store.insert_posting(rust, 1, 3).unwrap();
    store.insert_posting(rust, 2, 1).unwrap();
    store.insert_posting(ferris, 2, 2).unwrap();
    store.insert_posting(crab, 2, 1).unwrap();
    store
}

fn app_for(store: impl IndexStore + 'static) -> Router {
    build_app(QueryService::new(Arc::new(store)))
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let (status, json) = call(app_for(build_tiny_index()), "/api/search?q=Rust%20the%20language").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["query"], "Rust the language");
    assert_eq!(json["processed_terms"], serde_json::json!(["rust", "language", "ferris"]));

    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["title"], "Meet Ferris");
    assert_eq!(arr[0]["relevance_score"], 3);
    assert_eq!(arr[0]["matched_count"], 2);
    assert_eq!(arr[0]["matched_terms"], serde_json::json!(["ferris", "rust"]));
    assert_eq!(arr[0]["date"], "2021-09-01");
    assert_eq!(arr[1]["url"], "https://example.org/book");
    assert_eq!(arr[1]["author"], "Steve");
}

#[tokio::test]
async fn unknown_terms_are_not_found() {
    let (status, json) = call(app_for(build_tiny_index()), "/api/search?q=haskell").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["query"], "haskell");
    assert_eq!(json["processed_terms"], serde_json::json!(["haskell"]));
    assert!(json.get("results").is_none());
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn missing_query_is_bad_request() {
    for uri in ["/api/search", "/api/search?q=", "/api/search?q=%20%20"] {
        let (status, json) = call(app_for(build_tiny_index()), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["error"], "missing query");
    }
}

#[tokio::test]
async fn malformed_query_string_is_json_bad_request() {
    let (status, json) = call(app_for(build_tiny_index()), "/api/search?q=rust&q=crab").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("duplicate field"));
}

#[tokio::test]
async fn stop_words_are_bad_request() {
    let (status, json) = call(app_for(build_tiny_index()), "/api/search?q=a%20an%20the").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "only stop words or too short");
}

struct DownStore;

#[async_trait]
impl IndexStore for DownStore {
    async fn lookup_term_ids(&self, _names: &[String]) -> StoreResult<Vec<TermId>> {
        Err(StoreError::Snapshot("connection refused at 10.0.0.5".into()))
    }
    async fn synonyms_of(&self, _term: &str) -> StoreResult<Vec<String>> {
        Err(StoreError::Snapshot("connection refused at 10.0.0.5".into()))
    }
    async fn aggregate_by_document(&self, _term_ids: &[TermId]) -> StoreResult<Vec<ScoredDocument>> {
        Err(StoreError::Snapshot("connection refused at 10.0.0.5".into()))
    }
    async fn now(&self) -> StoreResult<OffsetDateTime> {
        Err(StoreError::Snapshot("connection refused at 10.0.0.5".into()))
    }
}

#[tokio::test]
async fn storage_faults_are_hidden_behind_500() {
    let (status, json) = call(app_for(DownStore), "/api/search?q=rust").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Internal server error");
    assert!(!json.to_string().contains("10.0.0.5"));

    let (status, json) = call(app_for(DownStore), "/api/test-db").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_db_reports_store_clock() {
    let (status, json) = call(app_for(build_tiny_index()), "/api/test-db").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(json["data"][0]["now"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn serves_from_snapshot_directory() {
    let dir = tempdir().unwrap();
    save_snapshot(&SnapshotPaths::new(dir.path()), &build_tiny_index().snapshot()).unwrap();

    let store = Store::open(&Backend::Snapshot(dir.path().to_path_buf())).await.unwrap();
    let app = build_app(QueryService::new(store.index.clone()));
    let (status, json) = call(app, "/api/search?q=crustacean").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["processed_terms"], serde_json::json!(["crustacean", "crab"]));
    assert_eq!(json["results"][0]["title"], "Meet Ferris");
    store.close().await;
}

#[tokio::test]
async fn root_and_health_respond() {
    let app = app_for(build_tiny_index());
    let resp = app.clone().oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app.oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
