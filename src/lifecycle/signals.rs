//! Termination triggers.
//!
//! # Responsibilities
//! - Register OS handlers for SIGTERM/SIGINT (Ctrl-C elsewhere)
//! - Expose termination as a pluggable [`TerminationSource`]
//! - Collapse "signal or root cancellation" into a single [`Trigger`]
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - `OsSignals` installs handlers at construction, so signals arriving
//!   before `wait` are not lost
//! - Only the first trigger matters; sources are one-shot

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Something that eventually asks the process to terminate.
pub trait TerminationSource {
    /// Resolves when termination has been requested.
    fn wait(&mut self) -> impl Future<Output = ()> + Send;
}

/// What ended the wait for termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The termination source fired (OS signal or manual trigger).
    Signal,
    /// The root token was cancelled by its owner.
    RootCancelled,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Signal => write!(f, "signal"),
            Trigger::RootCancelled => write!(f, "root-cancelled"),
        }
    }
}

/// Termination requested by the operating system.
#[derive(Debug)]
pub struct OsSignals {
    #[cfg(unix)]
    interrupt: Option<tokio::signal::unix::Signal>,
    #[cfg(unix)]
    terminate: Option<tokio::signal::unix::Signal>,
}

impl OsSignals {
    /// Install the signal handlers.
    ///
    /// A handler that cannot be registered is logged and never fires.
    #[cfg(unix)]
    pub fn new() -> Self {
        use tokio::signal::unix::{signal, SignalKind};

        let register = |kind: SignalKind, name: &'static str| match signal(kind) {
            Ok(stream) => Some(stream),
            Err(e) => {
                tracing::error!(signal = name, error = %e, "Failed to install signal handler");
                None
            }
        };

        Self {
            interrupt: register(SignalKind::interrupt(), "SIGINT"),
            terminate: register(SignalKind::terminate(), "SIGTERM"),
        }
    }

    /// Install the signal handlers.
    #[cfg(not(unix))]
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for OsSignals {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn recv_or_pending(stream: &mut Option<tokio::signal::unix::Signal>) {
    if let Some(s) = stream {
        if s.recv().await.is_some() {
            return;
        }
    }
    std::future::pending::<()>().await
}

impl TerminationSource for OsSignals {
    #[cfg(unix)]
    async fn wait(&mut self) {
        tokio::select! {
            _ = recv_or_pending(&mut self.interrupt) => {
                tracing::info!("Received SIGINT");
            }
            _ = recv_or_pending(&mut self.terminate) => {
                tracing::info!("Received SIGTERM");
            }
        }
    }

    #[cfg(not(unix))]
    async fn wait(&mut self) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl-C"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await
            }
        }
    }
}

/// Programmatic one-shot termination trigger.
///
/// Clones share the same trigger. Requests after the first only bump
/// [`trigger_count`](Self::trigger_count).
#[derive(Debug, Clone, Default)]
pub struct ManualTermination {
    token: CancellationToken,
    requests: Arc<AtomicUsize>,
}

impl ManualTermination {
    /// Create an untriggered source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination.
    pub fn trigger(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.token.cancel();
    }

    /// Whether termination has been requested.
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Number of times [`trigger`](Self::trigger) was called.
    pub fn trigger_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl TerminationSource for ManualTermination {
    async fn wait(&mut self) {
        self.token.cancelled().await;
    }
}

/// Block until `source` fires or `root` is cancelled.
///
/// A root token that is already cancelled wins immediately.
pub async fn wait_for_termination<S>(root: &CancellationToken, source: &mut S) -> Trigger
where
    S: TerminationSource,
{
    tokio::select! {
        biased;
        _ = root.cancelled() => Trigger::RootCancelled,
        _ = source.wait() => Trigger::Signal,
    }
}

/// Block until the process receives SIGINT/SIGTERM or `root` is cancelled.
pub async fn wait_for_termination_signal(root: &CancellationToken) -> Trigger {
    let mut signals = OsSignals::new();
    wait_for_termination(root, &mut signals).await
}
