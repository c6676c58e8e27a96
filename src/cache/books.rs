//! Cache-aside accessor for the book listing
//!
//! The whole collection lives under one key. Any book write deletes that key,
//! so the next listing re-reads the store and repopulates it. There is no TTL.
//!
//! The store and the cache are never updated atomically: a crash between a
//! commit and the invalidation that follows leaves the listing stale until
//! the next book is created.

use super::store::{CacheError, CacheStore};
use crate::storage::{Book, Database};
use crate::Result;
use std::sync::Arc;

/// The only key this service writes
pub const BOOKS_CACHE_KEY: &str = "books";

/// Outcome of reading the cached listing
#[derive(Debug)]
pub enum CacheLookup {
    Hit(Vec<Book>),
    Miss,
    /// The store failed or held an undecodable payload; handled like a miss
    Unavailable(CacheError),
}

/// Cache-aside wrapper around "list all books"
#[derive(Clone)]
pub struct BookListingCache {
    store: Arc<dyn CacheStore>,
}

impl BookListingCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Read the cached listing without falling back
    pub fn lookup(&self) -> CacheLookup {
        let payload = match self.store.get(BOOKS_CACHE_KEY) {
            Ok(Some(payload)) => payload,
            Ok(None) => return CacheLookup::Miss,
            Err(e) => return CacheLookup::Unavailable(e),
        };

        match serde_json::from_str::<Vec<Book>>(&payload) {
            Ok(books) => CacheLookup::Hit(books),
            Err(e) => CacheLookup::Unavailable(e.into()),
        }
    }

    /// Store `books` under the listing key
    pub fn populate(&self, books: &[Book]) -> std::result::Result<(), CacheError> {
        let payload = serde_json::to_string(books)?;
        self.store.set(BOOKS_CACHE_KEY, &payload)
    }

    /// All books, from the cache when possible
    ///
    /// Cache failures never reach the caller. A storage session is only
    /// acquired on a miss, and held until the cache has been repopulated.
    pub async fn get_books_listing(&self, db: &Database) -> Result<Vec<Book>> {
        match self.lookup() {
            CacheLookup::Hit(books) => {
                tracing::debug!(count = books.len(), "Book listing served from cache");
                return Ok(books);
            }
            CacheLookup::Miss => {
                tracing::debug!("Book listing cache miss");
            }
            CacheLookup::Unavailable(e) => {
                tracing::warn!(error = %e, "Cache read failed, falling back to database");
            }
        }

        let session = db.session().await;
        let books = session.list_books()?;

        // Written before the session is released: a create cannot commit and
        // invalidate between our read and this write.
        if let Err(e) = self.populate(&books) {
            tracing::warn!(error = %e, "Failed to populate book listing cache");
        }
        drop(session);

        Ok(books)
    }

    /// Drop the cached listing; failures are logged and ignored
    pub fn invalidate_books_listing(&self) {
        match self.store.delete(BOOKS_CACHE_KEY) {
            Ok(()) => tracing::debug!("Book listing cache invalidated"),
            Err(e) => tracing::warn!(error = %e, "Failed to invalidate book listing cache"),
        }
    }
}
