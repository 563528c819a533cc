//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Pick the output format from config
//! - Resolve the log filter from the environment or config
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` takes precedence over the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Error type for logging setup.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter '{directive}': {source}")]
    Filter {
        directive: String,
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("a global logger is already installed")]
    AlreadyInitialized,
}

/// Build the filter: `RUST_LOG` if set and valid, else the configured level.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directive = config.level.to_ascii_lowercase();
    EnvFilter::try_new(&directive).map_err(|source| LoggingError::Filter { directive, source })
}

/// Install the global subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    installed.map_err(|_| LoggingError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_rejected() {
        let config = LoggingConfig::default();
        // Another test may have installed a subscriber first.
        let _ = init_logging(&config);
        assert!(matches!(
            init_logging(&config),
            Err(LoggingError::AlreadyInitialized)
        ));
    }
}
