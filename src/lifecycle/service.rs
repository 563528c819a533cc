//! Lifecycle contract for long-running services.
//!
//! A managed service starts without blocking and stops within a
//! [`ShutdownContext`] deadline. Shutdown cleanup callbacks drive it.

use std::future::Future;

use crate::lifecycle::context::ShutdownContext;

/// Errors reported by [`ManagedService::shutdown`].
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// `shutdown` was called on a service that was never started, or twice.
    #[error("service is not running")]
    NotRunning,

    /// In-flight work was still outstanding when the deadline passed.
    #[error("in-flight work abandoned after {grace_ms}ms grace period")]
    DeadlineExceeded { grace_ms: u64 },

    /// The service failed while serving.
    #[error("serve error: {0}")]
    Serve(#[from] std::io::Error),

    /// The service task panicked or was cancelled.
    #[error("service task failed: {0}")]
    Join(String),
}

/// A long-running service with a non-blocking start and a bounded stop.
pub trait ManagedService {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Start serving in the background.
    ///
    /// Startup failures surface through the service's own logs and the
    /// result of a later [`shutdown`](Self::shutdown).
    fn run_async(&mut self);

    /// Stop accepting new work and wait up to the context deadline for
    /// in-flight work. Must return by the deadline; outstanding work is
    /// abandoned.
    fn shutdown(
        &mut self,
        ctx: &ShutdownContext,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}
