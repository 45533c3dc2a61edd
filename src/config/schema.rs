//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the news server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, connection limit, read budget).
    pub listener: ListenerConfig,

    /// Where category datasets live.
    pub dataset: DatasetConfig,

    /// Per-connection read/write deadlines.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:9999").
    pub bind_address: String,

    /// Maximum connections handled at once. `1` serves strictly one
    /// connection at a time.
    pub max_connections: usize,

    /// Maximum bytes read from a connection for one request.
    pub read_buffer_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:9999".to_string(),
            max_connections: 1,
            read_buffer_bytes: 1024,
        }
    }
}

/// Dataset location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Directory holding one `<category>.<extension>` file per category.
    pub data_dir: PathBuf,

    /// File extension without the leading dot.
    pub extension: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            extension: "csv".to_string(),
        }
    }
}

/// Timeout configuration for connection I/O.
///
/// A value of `0` disables the corresponding deadline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for reading the request, in seconds.
    pub read_secs: u64,

    /// Deadline for writing the response, in seconds.
    pub write_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 30,
            write_secs: 30,
        }
    }
}

impl TimeoutConfig {
    /// Read deadline, if enabled.
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_secs > 0).then(|| Duration::from_secs(self.read_secs))
    }

    /// Write deadline, if enabled.
    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_secs > 0).then(|| Duration::from_secs(self.write_secs))
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        assert_eq!(config.listener.max_connections, 1);
        assert_eq!(config.listener.read_buffer_bytes, 1024);
        assert_eq!(config.dataset.extension, "csv");
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [listener]
            max_connections = 8

            [dataset]
            data_dir = "/srv/news"

            [timeouts]
            read_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.max_connections, 8);
        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        assert_eq!(config.dataset.data_dir, PathBuf::from("/srv/news"));
        assert_eq!(config.dataset.extension, "csv");
        assert_eq!(config.timeouts.read_timeout(), None);
        assert_eq!(config.timeouts.write_timeout(), Some(Duration::from_secs(30)));
    }
}
