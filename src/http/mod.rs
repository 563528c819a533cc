//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, graceful stop)
//!     → request.rs (assign / propagate request ID)
//!     → handlers.rs (route handlers)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{HttpServer, ServerError};
