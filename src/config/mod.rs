//! Configuration system
//!
//! Loads ~/.config/bookreview/config.yaml with sections for:
//! - HTTP server (bind address, body size limit)
//! - Relational store (SQLite path, WAL mode)
//! - Cache store backing the book listing (memory or SQLite)

mod service_config;
pub mod validation;

pub use service_config::{CacheBackend, CacheSettings, DatabaseConfig, ServerConfig, ServiceConfig};
pub use validation::{validate_config, validate_config_result, ValidationError};
