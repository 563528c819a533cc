//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! application.toml
//!     + application-{env}.toml
//!     + APP__SECTION__KEY environment variables
//!     → loader.rs (merge & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A load failure is fatal and happens before anything else starts

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config_for_env, load_config_with_overrides, ConfigError};
pub use schema::{LogFormat, LoggingConfig, ServerConfig, ServiceConfig, ShutdownConfig};
pub use validation::ValidationError;
