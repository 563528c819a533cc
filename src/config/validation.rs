//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All problems are
//! collected, not just the first.

use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("service.name must not be empty")]
    EmptyServiceName,

    #[error("server.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("logging.level '{0}' is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.server.bind_address.clone(),
        ));
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ServiceConfig::default()), Ok(()));
    }

    #[test]
    fn zero_shutdown_timeout_is_allowed() {
        let mut config = ServiceConfig::default();
        config.shutdown.timeout_ms = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ServiceConfig::default();
        config.service.name = "  ".into();
        config.server.bind_address = "localhost".into();
        config.server.request_timeout_secs = 0;
        config.logging.level = "verbose".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyServiceName,
                ValidationError::InvalidBindAddress("localhost".into()),
                ValidationError::ZeroRequestTimeout,
                ValidationError::InvalidLogLevel("verbose".into()),
            ]
        );
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = ServiceConfig::default();
        config.logging.level = "DEBUG".into();
        assert!(validate_config(&config).is_ok());
    }
}
