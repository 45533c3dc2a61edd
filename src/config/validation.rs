//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (connection limit > 0, read budget bounded)
//! - Check addresses parse before the listener tries to bind
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServerConfig;

/// Smallest accepted read budget in bytes.
pub const MIN_READ_BUFFER_BYTES: usize = 64;
/// Largest accepted read budget in bytes.
pub const MAX_READ_BUFFER_BYTES: usize = 1024 * 1024;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a socket address")]
    InvalidAddress { field: &'static str, value: String },
    #[error("listener.max_connections must be greater than 0")]
    ZeroConnections,
    #[error("listener.read_buffer_bytes must be within 64..=1048576, got {0}")]
    ReadBufferOutOfRange(usize),
    #[error("dataset.extension '{0}' must be non-empty, without a leading dot or path separators")]
    InvalidExtension(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }

    let read_budget = config.listener.read_buffer_bytes;
    if !(MIN_READ_BUFFER_BYTES..=MAX_READ_BUFFER_BYTES).contains(&read_budget) {
        errors.push(ValidationError::ReadBufferOutOfRange(read_budget));
    }

    let ext = &config.dataset.extension;
    if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
        errors.push(ValidationError::InvalidExtension(ext.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
