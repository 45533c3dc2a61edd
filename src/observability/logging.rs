//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Map `--verbose` and the configured level onto an `EnvFilter`
//!
//! # Design Decisions
//! - `RUST_LOG` always wins over config and flags
//! - Verbose means `debug` for this crate, where raw traffic is logged

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool, log_level: &str) -> String {
    let level = if verbose { "debug" } else { log_level };
    format!("news_server={}", level)
}

/// Install the global subscriber.
///
/// Returns an error if a subscriber was already installed.
pub fn init_logging(
    verbose: bool,
    log_level: &str,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(verbose, log_level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_overrides_level() {
        assert_eq!(default_directive(false, "warn"), "news_server=warn");
        assert_eq!(default_directive(true, "warn"), "news_server=debug");
    }
}
