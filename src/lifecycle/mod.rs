//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging → Bind → Register routes → run_async
//!
//! Shutdown (shutdown.rs):
//!     Trigger (signals.rs) → ShutdownContext (context.rs) → cleanup → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT or root cancellation → single Trigger
//!
//! Services (service.rs):
//!     run_async → ... → shutdown(ctx): stop accepting, drain, give up at deadline
//! ```
//!
//! # Design Decisions
//! - Root context is a `CancellationToken` owned by the host, observed by all
//! - Cleanup runs at most once (`FnOnce`), after exactly one trigger
//! - Shutdown has a deadline, but it is advisory: no forced process exit

pub mod context;
pub mod service;
pub mod shutdown;
pub mod signals;

pub use context::{DeadlineExceeded, ShutdownContext};
pub use service::{ManagedService, ServiceError};
pub use shutdown::{wait_for_shutdown, wait_for_shutdown_with, CleanupOutcome, ShutdownReport};
pub use signals::{
    wait_for_termination, wait_for_termination_signal, ManualTermination, OsSignals,
    TerminationSource, Trigger,
};
