//! SQLite cache store implementation

use super::store::{CacheError, CacheResult, CacheStore};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// Cache store persisted in its own SQLite file
///
/// Survives restarts, which the in-memory store does not. Kept separate from
/// the main database so it is never part of a store transaction.
pub struct SqliteCacheStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteCacheStore {
    /// Open or create a cache database
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::Unavailable(format!(
                    "cannot create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tracing::info!(path = %path.display(), "Opening cache database");

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> CacheResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> CacheResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    fn conn(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CacheError::Unavailable("cache connection lock poisoned".to_string()))
    }

    /// Remove every entry
    pub fn clear(&self) -> CacheResult<()> {
        tracing::info!("Clearing cache");
        self.conn()?.execute("DELETE FROM cache_entries", [])?;
        Ok(())
    }

    /// Number of stored entries
    pub fn len(&self) -> CacheResult<usize> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Get the database path, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl CacheStore for SqliteCacheStore {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value, updated_at) VALUES (?, ?, ?)",
            params![key, value, now_millis()],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.conn()?
            .execute("DELETE FROM cache_entries WHERE key = ?", [key])?;
        Ok(())
    }
}
