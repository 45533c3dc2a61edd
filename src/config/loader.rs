//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `listener.bind_address`.
pub const ENV_BIND: &str = "NEWS_SERVER_BIND";
/// Environment variable overriding `dataset.data_dir`.
pub const ENV_DATA_DIR: &str = "NEWS_SERVER_DATA_DIR";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[source] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ServerConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `NEWS_SERVER_*` overrides from the process environment.
pub fn apply_env_overrides(config: &mut ServerConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides(config: &mut ServerConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(bind) = lookup(ENV_BIND).filter(|v| !v.is_empty()) {
        config.listener.bind_address = bind;
    }
    if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
        config.dataset.data_dir = PathBuf::from(dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listener]\nbind_address = \"0.0.0.0:8000\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
    }

    #[test]
    fn reports_parse_and_validation_failures() {
        let mut bad_toml = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad_toml, "[listener\nbind_address = 1").unwrap();
        assert!(matches!(load_config(bad_toml.path()), Err(ConfigError::Parse(_))));

        let mut invalid = tempfile::NamedTempFile::new().unwrap();
        writeln!(invalid, "[listener]\nmax_connections = 0").unwrap();
        match load_config(invalid.path()) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::ZeroConnections]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn validation_message_lists_every_error() {
        let err = ConfigError::Validation(vec![
            ValidationError::ZeroConnections,
            ValidationError::ReadBufferOutOfRange(8),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: listener.max_connections must be greater than 0, \
             listener.read_buffer_bytes must be within 64..=1048576, got 8"
        );
    }

    #[test]
    fn env_overrides_replace_non_empty_values() {
        let mut config = ServerConfig::default();
        apply_overrides(&mut config, |key| match key {
            ENV_BIND => Some("0.0.0.0:7000".into()),
            ENV_DATA_DIR => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.listener.bind_address, "0.0.0.0:7000");
        assert_eq!(config.dataset.data_dir, PathBuf::from("."));
    }
}
