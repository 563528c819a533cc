//! Shutdown coordination.
//!
//! Owns the tail of the process lifetime: wait for a termination trigger,
//! then run the host's cleanup exactly once under a deadline.
//!
//! ```text
//! wait_for_termination ──▶ ShutdownContext::new(grace) ──▶ cleanup(ctx) ──▶ report
//! ```
//!
//! The deadline is advisory. The coordinator never preempts cleanup and
//! never kills the process; a cleanup that ignores its context can hang.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::context::ShutdownContext;
use crate::lifecycle::signals::{wait_for_termination, OsSignals, TerminationSource, Trigger};

/// How the cleanup callback ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Returned before the deadline.
    Completed,
    /// Returned well past the deadline (beyond scheduling slack).
    OverranDeadline,
    /// Panicked; the payload message is kept for reporting.
    Panicked(String),
}

/// Summary of a completed shutdown sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// What ended the wait.
    pub trigger: Trigger,
    /// How cleanup ended.
    pub outcome: CleanupOutcome,
    /// Grace period granted to cleanup.
    pub grace: Duration,
    /// Time from the trigger to cleanup returning.
    pub elapsed: Duration,
}

/// Wait for SIGINT/SIGTERM (or cancellation of `root`), then run `cleanup`
/// with a context expiring `timeout_ms` milliseconds later.
///
/// A timeout of zero hands cleanup an already expired context; cleanup is
/// still invoked.
///
/// Signal handlers are installed on first poll. Hosts that start work
/// before awaiting this build [`OsSignals`] up front and call
/// [`wait_for_shutdown_with`].
pub async fn wait_for_shutdown<F, Fut>(
    root: &CancellationToken,
    timeout_ms: u64,
    cleanup: F,
) -> ShutdownReport
where
    F: FnOnce(ShutdownContext) -> Fut,
    Fut: Future<Output = ()>,
{
    wait_for_shutdown_with(root, Duration::from_millis(timeout_ms), OsSignals::new(), cleanup).await
}

/// Like [`wait_for_shutdown`], with an explicit termination source.
pub async fn wait_for_shutdown_with<S, F, Fut>(
    root: &CancellationToken,
    grace: Duration,
    mut source: S,
    cleanup: F,
) -> ShutdownReport
where
    S: TerminationSource,
    F: FnOnce(ShutdownContext) -> Fut,
    Fut: Future<Output = ()>,
{
    let trigger = wait_for_termination(root, &mut source).await;
    let ctx = ShutdownContext::new(grace);

    tracing::info!(
        trigger = %trigger,
        grace_ms = grace.as_millis() as u64,
        "Termination requested, running cleanup"
    );

    let outcome = match run_cleanup(cleanup, ctx).await {
        Ok(()) if overran(&ctx) => {
            tracing::warn!(
                grace_ms = grace.as_millis() as u64,
                "Cleanup returned after its deadline"
            );
            CleanupOutcome::OverranDeadline
        }
        Ok(()) => CleanupOutcome::Completed,
        Err(message) => {
            tracing::error!(panic = %message, "Cleanup panicked, continuing shutdown");
            CleanupOutcome::Panicked(message)
        }
    };

    let elapsed = ctx.started().elapsed();
    tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "Shutdown sequence finished");

    ShutdownReport {
        trigger,
        outcome,
        grace,
        elapsed,
    }
}

/// Slack past the deadline still counted as honoring it. Cleanup that
/// gives up exactly at `ctx.expired()` returns a few ticks late.
const DEADLINE_TOLERANCE: Duration = Duration::from_millis(50);

fn overran(ctx: &ShutdownContext) -> bool {
    !ctx.grace().is_zero()
        && Instant::now().saturating_duration_since(ctx.deadline()) > DEADLINE_TOLERANCE
}

/// Invoke cleanup, turning a panic (while building or polling the future)
/// into its message.
async fn run_cleanup<F, Fut>(cleanup: F, ctx: ShutdownContext) -> Result<(), String>
where
    F: FnOnce(ShutdownContext) -> Fut,
    Fut: Future<Output = ()>,
{
    let fut = std::panic::catch_unwind(AssertUnwindSafe(|| cleanup(ctx))).map_err(panic_message)?;
    AssertUnwindSafe(fut).catch_unwind().await.map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
