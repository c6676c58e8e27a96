//! Configuration validation
//!
//! Validates the service configuration before the server starts:
//! - Bind address parses as a socket address
//! - Body size limit is non-zero
//! - Database and cache paths are set

use super::service_config::{CacheBackend, ServiceConfig};
use crate::BookReviewError;
use std::net::SocketAddr;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a service configuration, collecting every problem found
pub fn validate_config(config: &ServiceConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.server.addr.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.addr",
            format!("Invalid socket address: '{}'", config.server.addr),
        ));
    }

    if config.server.max_body_size == 0 {
        errors.push(ValidationError::new(
            "server.max_body_size",
            "Body size limit must be greater than 0",
        ));
    }

    if config.database.path.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "database.path",
            "Database path cannot be empty",
        ));
    }

    if config.cache.backend == CacheBackend::Sqlite {
        if config.cache.path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "cache.path",
                "Cache path cannot be empty for the sqlite backend",
            ));
        } else if config.cache.path == config.database.path {
            errors.push(ValidationError::new(
                "cache.path",
                "Cache database must be a different file from the main database",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate and fold all errors into a single [`BookReviewError::Config`]
pub fn validate_config_result(config: &ServiceConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let joined = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        BookReviewError::Config(joined)
    })
}
