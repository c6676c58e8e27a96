//! HTTP server for the book review service
//!
//! # Routes
//!
//! - `GET /health` - Liveness probe
//! - `GET /books` - List all books (cache-aside)
//! - `POST /books` - Create a book (body: `{"title": "...", "author": "..."}`)
//! - `GET /books/{book_id}/reviews` - List reviews for a book
//! - `POST /books/{book_id}/reviews` - Create a review (body: `{"reviewer", "content"}`)
//!
//! # Example
//!
//! ```no_run
//! use bookreview::cache::MemoryCacheStore;
//! use bookreview::server::BookServer;
//! use bookreview::storage::Database;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let db = Database::open_in_memory().expect("Failed to open database");
//!     let server = BookServer::new(db, Arc::new(MemoryCacheStore::new()));
//!
//!     server.run("127.0.0.1:8000").await.expect("Server failed");
//! }
//! ```

use crate::cache::{self, BookListingCache, CacheStore};
use crate::config::ServiceConfig;
use crate::storage::{Book, Database, NewBook, NewReview, Review};
use crate::BookReviewError;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, DefaultBodyLimit, FromRequest, Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;

/// Default request body size limit in bytes
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Server error types
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bind error: {0}")]
    Bind(String),
}

/// Shared handles injected into every handler
struct AppState {
    db: Database,
    books_cache: BookListingCache,
    max_body_size: usize,
}

/// HTTP server for books and reviews
pub struct BookServer {
    state: Arc<AppState>,
}

impl BookServer {
    /// Create a server with the default body size limit
    pub fn new(db: Database, cache_store: Arc<dyn CacheStore>) -> Self {
        Self::with_body_limit(db, cache_store, DEFAULT_MAX_BODY_SIZE)
    }

    pub fn with_body_limit(
        db: Database,
        cache_store: Arc<dyn CacheStore>,
        max_body_size: usize,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                db,
                books_cache: BookListingCache::new(cache_store),
                max_body_size,
            }),
        }
    }

    /// Open the database and cache store named by `config`
    pub fn from_config(config: &ServiceConfig) -> crate::Result<Self> {
        let db = Database::open(&config.database)?;
        let cache_store = cache::open_store(&config.cache)?;
        Ok(Self::with_body_limit(
            db,
            cache_store,
            config.server.max_body_size,
        ))
    }

    /// Build the router with logging middleware and body limit
    pub fn router(&self) -> Router {
        Self::build_router(self.state.clone())
    }

    fn build_router(state: Arc<AppState>) -> Router {
        let max_body_size = state.max_body_size;

        Router::new()
            .route("/health", get(health))
            .route("/books", get(list_books).post(create_book))
            .route(
                "/books/{book_id}/reviews",
                get(list_reviews).post(create_review),
            )
            .layer(middleware::from_fn(log_requests))
            .layer(DefaultBodyLimit::max(max_body_size))
            .with_state(state)
    }

    /// Run the server on the given address
    pub async fn run(self, addr: &str) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("{}: {}", addr, e)))?;

        tracing::info!(
            addr = addr,
            max_body_size = self.state.max_body_size,
            database = ?self.state.db.path(),
            "Book review server listening"
        );

        axum::serve(listener, Self::build_router(self.state))
            .await
            .map_err(ServerError::Io)
    }

    /// Get a reference to the database (for testing)
    pub fn database(&self) -> &Database {
        &self.state.db
    }
}

/// One log line per request
async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Handled request"
    );

    response
}

// ============================================================================
// Request/Response types
// ============================================================================

/// DTO for a review; the parent book is implied by the route
#[derive(Debug, Serialize)]
pub struct ReviewDto {
    pub id: i64,
    pub reviewer: String,
    pub content: String,
}

impl From<Review> for ReviewDto {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            reviewer: review.reviewer,
            content: review.content,
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error, rendered as a status code and [`ErrorResponse`]
#[derive(Debug)]
pub enum ApiError {
    Service(BookReviewError),
    /// The body was not JSON, or did not match the request type
    Rejected(JsonRejection),
}

impl From<BookReviewError> for ApiError {
    fn from(err: BookReviewError) -> Self {
        Self::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Rejected(rejection) => {
                tracing::debug!(error = %rejection, "Request body rejected");
                (rejection.status(), rejection.body_text())
            }
            Self::Service(err) => {
                if err.is_client_error() {
                    tracing::debug!(error = %err, "Request refused");
                } else {
                    tracing::error!(error = %err, "Request failed");
                }

                match err {
                    BookReviewError::BookNotFound(_) => {
                        (StatusCode::NOT_FOUND, "Book not found".to_string())
                    }
                    BookReviewError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    ),
                }
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// `Json` extractor whose rejections use the [`ErrorResponse`] body
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_books(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state.books_cache.get_books_listing(&state.db).await?;
    Ok(Json(books))
}

async fn create_book(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<NewBook>,
) -> Result<Json<Book>, ApiError> {
    req.validate()?;

    let book = {
        let mut session = state.db.session().await;
        session.insert_book(&req)?
    };

    state.books_cache.invalidate_books_listing();

    Ok(Json(book))
}

async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<i64>,
) -> Result<Json<Vec<ReviewDto>>, ApiError> {
    let session = state.db.session().await;

    if session.find_book(book_id)?.is_none() {
        return Err(BookReviewError::BookNotFound(book_id).into());
    }

    let reviews = session.list_reviews(book_id)?;
    Ok(Json(reviews.into_iter().map(ReviewDto::from).collect()))
}

async fn create_review(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<i64>,
    AppJson(req): AppJson<NewReview>,
) -> Result<Json<ReviewDto>, ApiError> {
    req.validate()?;

    let mut session = state.db.session().await;

    if session.find_book(book_id)?.is_none() {
        tracing::debug!(book_id, "Review rejected, book does not exist");
        return Err(BookReviewError::BookNotFound(book_id).into());
    }

    let review = session.insert_review(book_id, &req)?;
    Ok(Json(review.into()))
}
