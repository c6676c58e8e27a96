//! Service configuration file handling
//!
//! Loads and manages the ~/.config/bookreview/config.yaml file.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding the config file and the default database files
fn config_dir() -> PathBuf {
    // Always use ~/.config for consistency across platforms (macOS, Linux)
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("bookreview");
    path
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. 127.0.0.1:8000
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Request body size limit in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Relational store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Enable WAL mode for better concurrency
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

fn default_database_path() -> PathBuf {
    config_dir().join("app.db")
}

fn default_wal_mode() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

/// Which cache store backs the book listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// Process-local map, emptied on restart
    #[default]
    Memory,
    /// Key-value table in a separate SQLite file
    Sqlite,
}

impl std::str::FromStr for CacheBackend {
    type Err = crate::BookReviewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "sqlite" => Ok(CacheBackend::Sqlite),
            other => Err(crate::BookReviewError::Config(format!(
                "Unknown cache backend '{}'. Must be one of: memory, sqlite",
                other
            ))),
        }
    }
}

/// Cache store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Path to the cache database (sqlite backend only)
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

fn default_cache_path() -> PathBuf {
    config_dir().join("cache.db")
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            path: default_cache_path(),
        }
    }
}

/// Book review service configuration
///
/// Represents the complete ~/.config/bookreview/config.yaml file. Every
/// section is optional; missing values fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub cache: CacheSettings,
}

impl ServiceConfig {
    /// Create a configuration with every default applied
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::BookReviewError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading service configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            addr = %config.server.addr,
            database = %config.database.path.display(),
            cache_backend = ?config.cache.backend,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving service configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/bookreview/config.yaml)
    pub fn default_path() -> PathBuf {
        config_dir().join("config.yaml")
    }
}
