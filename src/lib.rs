//! HTTP service bootstrap with bounded graceful shutdown.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::{wait_for_shutdown, ManagedService, ShutdownContext};
