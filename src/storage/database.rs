//! SQLite relational store

use super::models::{Book, NewBook, NewReview, Review};
use crate::config::DatabaseConfig;
use crate::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard};

/// Handle to the relational store
///
/// Owns a single connection. Request handlers never touch it directly; they
/// acquire a [`Session`] for the span of their storage work.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create the database described by `config`
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %config.path.display(), "Opening database");

        let conn = Connection::open(&config.path)?;

        if config.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }

        Self::with_connection(conn, Some(config.path.clone()))
    }

    /// Open a private in-memory database (tests and throwaway runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        // Off by default in SQLite; the cascade and the review->book reference
        // are only enforced with it on.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Acquire the connection for one request
    pub async fn session(&self) -> Session<'_> {
        Session {
            conn: self.conn.lock().await,
        }
    }

    /// Database file path, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY,
            book_id INTEGER NOT NULL,
            reviewer TEXT NOT NULL,
            content TEXT NOT NULL,
            FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS ix_reviews_book_id ON reviews(book_id);
        "#,
    )?;

    Ok(())
}

/// Scoped access to the store for a single request
///
/// Holds the connection lock; it is released when the session is dropped.
pub struct Session<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl Session<'_> {
    /// All books in ascending id order
    pub fn list_books(&self) -> Result<Vec<Book>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, author FROM books ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(Book {
                id: row.get(0)?,
                title: row.get(1)?,
                author: row.get(2)?,
            })
        })?;

        let mut books = Vec::new();
        for book in rows {
            books.push(book?);
        }

        tracing::debug!(count = books.len(), "Fetched books from the database");
        Ok(books)
    }

    pub fn find_book(&self, id: i64) -> Result<Option<Book>> {
        let book = self
            .conn
            .query_row(
                "SELECT id, title, author FROM books WHERE id = ?",
                [id],
                |row| {
                    Ok(Book {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        author: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(book)
    }

    /// Insert and commit a book, returning it with its assigned id
    pub fn insert_book(&mut self, new_book: &NewBook) -> Result<Book> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO books (title, author) VALUES (?, ?)",
            params![&new_book.title, &new_book.author],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::info!(book_id = id, title = %new_book.title, "Book created");

        Ok(Book {
            id,
            title: new_book.title.clone(),
            author: new_book.author.clone(),
        })
    }

    /// Reviews for `book_id` in insertion order
    pub fn list_reviews(&self, book_id: i64) -> Result<Vec<Review>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, book_id, reviewer, content FROM reviews WHERE book_id = ? ORDER BY id",
        )?;

        let rows = stmt.query_map([book_id], |row| {
            Ok(Review {
                id: row.get(0)?,
                book_id: row.get(1)?,
                reviewer: row.get(2)?,
                content: row.get(3)?,
            })
        })?;

        let mut reviews = Vec::new();
        for review in rows {
            reviews.push(review?);
        }

        Ok(reviews)
    }

    /// Insert and commit a review for an existing book
    pub fn insert_review(&mut self, book_id: i64, new_review: &NewReview) -> Result<Review> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO reviews (book_id, reviewer, content) VALUES (?, ?, ?)",
            params![book_id, &new_review.reviewer, &new_review.content],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::info!(book_id, review_id = id, "Review created");

        Ok(Review {
            id,
            book_id,
            reviewer: new_review.reviewer.clone(),
            content: new_review.content.clone(),
        })
    }

    /// Delete a book and, through the cascade, its reviews
    ///
    /// Not exposed over HTTP.
    pub fn delete_book(&mut self, id: i64) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM books WHERE id = ?", [id])?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_schema_creation() {
        let db = Database::open_in_memory().unwrap();
        let session = db.session().await;

        let mut stmt = session
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'index')")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();

        assert!(names.contains(&"books".to_string()));
        assert!(names.contains(&"reviews".to_string()));
        assert!(names.contains(&"ix_reviews_book_id".to_string()));
    }

    #[tokio::test]
    async fn test_empty_store() {
        let db = Database::open_in_memory().unwrap();
        let session = db.session().await;

        assert!(session.list_books().unwrap().is_empty());
        assert!(session.find_book(1).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_and_list_books() {
        let db = Database::open_in_memory().unwrap();
        let mut session = db.session().await;

        let first = session
            .insert_book(&NewBook::new("Test Book", "Author A"))
            .unwrap();
        let second = session
            .insert_book(&NewBook::new("Test Book", "Author A"))
            .unwrap();

        assert_eq!(first.id, 1);
        assert_ne!(first.id, second.id);

        let books = session.list_books().unwrap();
        assert_eq!(books, vec![first.clone(), second]);
        assert_eq!(session.find_book(first.id).unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_reviews_are_scoped_to_book() {
        let db = Database::open_in_memory().unwrap();
        let mut session = db.session().await;

        let dune = session.insert_book(&NewBook::new("Dune", "Herbert")).unwrap();
        let emma = session.insert_book(&NewBook::new("Emma", "Austen")).unwrap();

        let r1 = session
            .insert_review(dune.id, &NewReview::new("R", "Good"))
            .unwrap();
        let r2 = session
            .insert_review(dune.id, &NewReview::new("S", "Long"))
            .unwrap();
        session
            .insert_review(emma.id, &NewReview::new("T", "Fine"))
            .unwrap();

        let reviews = session.list_reviews(dune.id).unwrap();
        assert_eq!(reviews, vec![r1, r2]);
        assert_eq!(session.list_reviews(emma.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_review_requires_existing_book() {
        let db = Database::open_in_memory().unwrap();
        let mut session = db.session().await;

        let result = session.insert_review(999, &NewReview::new("R", "Good"));
        assert!(matches!(
            result,
            Err(crate::BookReviewError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_book_cascades_to_reviews() {
        let db = Database::open_in_memory().unwrap();
        let mut session = db.session().await;

        let book = session.insert_book(&NewBook::new("Dune", "Herbert")).unwrap();
        session
            .insert_review(book.id, &NewReview::new("R", "Good"))
            .unwrap();

        assert!(session.delete_book(book.id).unwrap());
        assert!(!session.delete_book(book.id).unwrap());

        let orphans: i64 = session
            .conn
            .query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            path: temp_dir.path().join("data").join("app.db"),
            wal_mode: true,
        };

        {
            let db = Database::open(&config).unwrap();
            assert_eq!(db.path(), Some(config.path.as_path()));
            let mut session = db.session().await;
            session.insert_book(&NewBook::new("Dune", "Herbert")).unwrap();
        }

        let db = Database::open(&config).unwrap();
        let session = db.session().await;
        assert_eq!(session.list_books().unwrap().len(), 1);
    }
}
