//! Cache layer for the book listing
//!
//! Provides the key-value store seam (in-memory or SQLite-backed) and the
//! cache-aside accessor that serves `GET /books`.

mod books;
mod sqlite;
mod store;

pub use books::{BookListingCache, CacheLookup, BOOKS_CACHE_KEY};
pub use sqlite::SqliteCacheStore;
pub use store::{CacheError, CacheResult, CacheStore, MemoryCacheStore};

use crate::config::{CacheBackend, CacheSettings};
use std::sync::Arc;

/// Build the cache store selected by configuration
pub fn open_store(settings: &CacheSettings) -> CacheResult<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match settings.backend {
        CacheBackend::Memory => {
            tracing::info!("Using in-memory cache store");
            Arc::new(MemoryCacheStore::new())
        }
        CacheBackend::Sqlite => Arc::new(SqliteCacheStore::open(&settings.path)?),
    };
    Ok(store)
}
