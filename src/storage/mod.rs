//! Storage layer
//!
//! Books and their reviews in SQLite. Reviews reference books through a
//! non-null foreign key with `ON DELETE CASCADE`.

mod database;
mod models;

pub use database::{Database, Session};
pub use models::{Book, NewBook, NewReview, Review};
