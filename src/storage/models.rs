//! Book and review records

use crate::{BookReviewError, Result};
use serde::{Deserialize, Serialize};

/// A stored book
///
/// Serializes as the flat record `{id, title, author}`; this is both the HTTP
/// response shape and the cached listing payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
}

/// A stored review, always attached to a live book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: i64,
    pub book_id: i64,
    pub reviewer: String,
    pub content: String,
}

/// Payload for creating a book
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }

    /// Reject blank fields before anything touches storage
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)?;
        require_text("author", &self.author)
    }
}

/// Payload for creating a review
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub reviewer: String,
    pub content: String,
}

impl NewReview {
    pub fn new(reviewer: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            reviewer: reviewer.into(),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_text("reviewer", &self.reviewer)?;
        require_text("content", &self.content)
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BookReviewError::Validation(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_flat_record_shape() {
        let book = Book {
            id: 1,
            title: "Test Book".into(),
            author: "Author A".into(),
        };
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "id": 1, "title": "Test Book", "author": "Author A" })
        );
    }

    #[test]
    fn test_new_book_validation() {
        assert!(NewBook::new("Dune", "Frank Herbert").validate().is_ok());

        let err = NewBook::new("", "Frank Herbert").validate().unwrap_err();
        assert!(err.to_string().contains("title"));

        let err = NewBook::new("Dune", "   ").validate().unwrap_err();
        assert!(err.to_string().contains("author"));
    }

    #[test]
    fn test_new_review_validation() {
        assert!(NewReview::new("R", "Good").validate().is_ok());
        assert!(NewReview::new("", "Good").validate().is_err());
        assert!(NewReview::new("R", "\n").validate().is_err());
    }
}
