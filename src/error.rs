//! Error types for the book review service
//!
//! Defines the error enum covering every failure mode that can reach a
//! request handler or the CLI. Uses thiserror for ergonomic error handling.
//!
//! Cache failures are deliberately absent from the HTTP-facing variants: the
//! cache-aside accessor absorbs them (see [`crate::cache::CacheError`]).

use crate::cache::CacheError;
use thiserror::Error;

/// Result type alias for book review operations
pub type Result<T> = std::result::Result<T, BookReviewError>;

/// Error type for book review operations
#[derive(Error, Debug)]
pub enum BookReviewError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested book does not exist
    #[error("Book not found: {0}")]
    BookNotFound(i64),

    /// Request payload failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Cache store errors (only surfaced by maintenance commands)
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl BookReviewError {
    /// True for errors caused by the caller rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BookReviewError::BookNotFound(_) | BookReviewError::Validation(_)
        )
    }
}
