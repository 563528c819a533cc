//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing macros (structured log events)
//!     → logging.rs (filter + pretty/JSON formatting)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through HTTP logs via `x-request-id`

pub mod logging;

pub use logging::{init_logging, LoggingError};
