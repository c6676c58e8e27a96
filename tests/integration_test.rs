//! Integration tests for the book review service
//!
//! These tests drive the full router, from request parsing through storage
//! and the book listing cache.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bookreview::cache::{CacheResult, CacheStore, MemoryCacheStore, BOOKS_CACHE_KEY};
use bookreview::config::{CacheBackend, ServiceConfig};
use bookreview::server::BookServer;
use bookreview::storage::Database;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

/// Memory store that remembers the keys it was asked for
#[derive(Default)]
struct SpyStore {
    inner: MemoryCacheStore,
    calls: Mutex<Vec<String>>,
}

impl SpyStore {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl CacheStore for SpyStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.calls.lock().unwrap().push(format!("get {}", key));
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.calls.lock().unwrap().push(format!("set {}", key));
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.calls.lock().unwrap().push(format!("delete {}", key));
        self.inner.delete(key)
    }
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

mod scenario_tests {
    use super::*;

    #[tokio::test]
    async fn test_book_and_review_walkthrough() {
        bookreview::logging::init_test();

        let store = Arc::new(SpyStore::default());
        let server = BookServer::new(Database::open_in_memory().unwrap(), store.clone());
        let app = server.router();

        let (status, body) = call(&app, "GET", "/books", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, book) = call(
            &app,
            "POST",
            "/books",
            Some(json!({ "title": "Test Book", "author": "Author A" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            book,
            json!({ "id": 1, "title": "Test Book", "author": "Author A" })
        );

        let (status, books) = call(&app, "GET", "/books", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(books, json!([book]));
        assert!(store.inner.get(BOOKS_CACHE_KEY).unwrap().is_some());

        let (status, review) = call(
            &app,
            "POST",
            "/books/1/reviews",
            Some(json!({ "reviewer": "R", "content": "Good" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(review, json!({ "id": 1, "reviewer": "R", "content": "Good" }));

        let (status, reviews) = call(&app, "GET", "/books/1/reviews", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reviews, json!([review]));

        let (status, body) = call(&app, "GET", "/books/999/reviews", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Book not found");
    }
}

mod cache_tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_miss_path_repopulates() {
        let store = Arc::new(SpyStore::default());
        let app = BookServer::new(Database::open_in_memory().unwrap(), store.clone()).router();

        call(
            &app,
            "POST",
            "/books",
            Some(json!({ "title": "Cache Book", "author": "Cache Author" })),
        )
        .await;
        store.inner.delete(BOOKS_CACHE_KEY).unwrap();
        store.clear_calls();

        let (status, books) = call(&app, "GET", "/books", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(books
            .as_array()
            .unwrap()
            .iter()
            .any(|b| b["title"] == "Cache Book"));
        assert_eq!(store.calls(), vec!["get books", "set books"]);
    }

    #[tokio::test]
    async fn test_sqlite_cache_backend_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ServiceConfig::default();
        config.database.path = temp_dir.path().join("app.db");
        config.cache.backend = CacheBackend::Sqlite;
        config.cache.path = temp_dir.path().join("cache.db");

        {
            let app = BookServer::from_config(&config).unwrap().router();
            call(
                &app,
                "POST",
                "/books",
                Some(json!({ "title": "Dune", "author": "Herbert" })),
            )
            .await;
            let (_, books) = call(&app, "GET", "/books", None).await;
            assert_eq!(books.as_array().unwrap().len(), 1);
        }

        // A restarted server serves the persisted listing from both stores
        let server = BookServer::from_config(&config).unwrap();
        {
            let session = server.database().session().await;
            assert_eq!(session.list_books().unwrap().len(), 1);
        }
        let (status, books) = call(&server.router(), "GET", "/books", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(books[0]["title"], "Dune");
    }
}
