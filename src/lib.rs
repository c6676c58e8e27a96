//! Book Review Service
//!
//! A small CRUD web service exposing books and their reviews, backed by SQLite
//! with a cache-aside read path for the book listing.
//!
//! # Architecture
//!
//! - **storage**: Book and review schema, per-request storage sessions
//! - **cache**: Key-value cache stores and the book listing cache-aside accessor
//! - **server**: axum router and request handlers
//! - **config**: YAML service configuration and validation
//! - **logging**: tracing subscriber setup

// Core modules
pub mod config;
pub mod error;
pub mod storage;

// Components
pub mod cache;
pub mod logging;
pub mod server;

// Re-exports
pub use error::{BookReviewError, Result};
