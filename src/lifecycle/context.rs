//! Deadline-bound context handed to shutdown cleanup.
//!
//! # Responsibilities
//! - Fix the cleanup deadline at the moment termination is observed
//! - Let cleanup code query the remaining grace period
//! - Let cleanup code race its own waits against the deadline
//!
//! # Design Decisions
//! - Expiry is purely time-based; nothing cancels it early
//! - Not linked to the root token: when root cancellation is the trigger,
//!   the grace period must still be granted in full
//! - The deadline is advisory; callers decide what to abandon

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Returned when a future raced against a [`ShutdownContext`] loses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("shutdown deadline exceeded after {grace:?}")]
pub struct DeadlineExceeded {
    /// Grace period that was granted.
    pub grace: Duration,
}

/// Context with a deadline, derived once termination has been observed.
#[derive(Debug, Clone, Copy)]
pub struct ShutdownContext {
    started: Instant,
    deadline: Instant,
}

impl ShutdownContext {
    /// Create a context whose deadline is `now + grace`.
    ///
    /// A zero grace period yields a context that is already expired.
    pub fn new(grace: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: started + grace,
        }
    }

    /// The instant after which cleanup should give up waiting.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// The instant this context was created (termination observed).
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Total grace period granted.
    pub fn grace(&self) -> Duration {
        self.deadline - self.started
    }

    /// Time left before the deadline, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Resolves once the deadline has passed.
    pub async fn expired(&self) {
        tokio::time::sleep_until(self.deadline).await;
    }

    /// Run `fut` until it completes or the deadline passes, whichever is first.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, DeadlineExceeded>
    where
        F: Future,
    {
        tokio::time::timeout_at(self.deadline, fut)
            .await
            .map_err(|_| DeadlineExceeded { grace: self.grace() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deadline_is_grace_after_creation() {
        let before = Instant::now();
        let ctx = ShutdownContext::new(Duration::from_millis(500));
        let after = Instant::now();

        assert!(ctx.deadline() >= before + Duration::from_millis(500));
        assert!(ctx.deadline() <= after + Duration::from_millis(500));
        assert_eq!(ctx.grace(), Duration::from_millis(500));
        assert!(!ctx.is_expired());
        assert!(ctx.remaining() <= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn zero_grace_is_already_expired() {
        let ctx = ShutdownContext::new(Duration::ZERO);

        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Duration::ZERO);

        // Must resolve without waiting.
        tokio::time::timeout(Duration::from_millis(50), ctx.expired())
            .await
            .expect("zero grace context should expire immediately");
    }

    #[tokio::test(start_paused = true)]
    async fn expires_on_its_own() {
        let ctx = ShutdownContext::new(Duration::from_secs(3));
        assert!(!ctx.is_expired());

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn run_races_against_deadline() {
        let ctx = ShutdownContext::new(Duration::from_millis(100));

        let fast = ctx.run(async { 7 }).await;
        assert_eq!(fast, Ok(7));

        let slow = ctx
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert_eq!(
            slow,
            Err(DeadlineExceeded {
                grace: Duration::from_millis(100)
            })
        );
    }
}
