//! Key-value cache store seam

use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Failure talking to a cache store
///
/// Never surfaced to HTTP callers; the book listing accessor treats every
/// variant as a miss or a no-op.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The store could not be reached or its state is unusable
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// The cached payload could not be encoded or decoded
    #[error("Cache payload error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The SQLite-backed store reported an error
    #[error("Cache backend error: {0}")]
    Backend(#[from] rusqlite::Error),
}

/// Result alias for cache store operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// External get/set/delete key-value service
///
/// Last write wins; no ordering or consistency guarantees beyond that.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> CacheResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> CacheResult<()>;

    /// Deleting an absent key is not an error
    fn delete(&self, key: &str) -> CacheResult<()>;
}

/// Process-local cache store
///
/// Contents live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> CacheResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory cache lock poisoned".to_string()))
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}
