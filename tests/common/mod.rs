//! Shared utilities for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use trunk_service::config::ServerConfig;
use trunk_service::lifecycle::{ManagedService, ServiceError, ShutdownContext};

/// Server config bound to an ephemeral local port.
#[allow(dead_code)]
pub fn local_server_config() -> ServerConfig {
    ServerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        request_timeout_secs: 10,
    }
}

/// What a [`FakeService`] observed.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FakeServiceStats {
    pub starts: AtomicUsize,
    pub shutdowns: AtomicUsize,
    /// Remaining deadline at each `shutdown` call.
    pub remaining_at_call: Mutex<Vec<Duration>>,
}

/// Service whose shutdown takes a fixed time, bounded by the deadline.
#[allow(dead_code)]
pub struct FakeService {
    pub drain_time: Duration,
    pub stats: Arc<FakeServiceStats>,
}

impl FakeService {
    #[allow(dead_code)]
    pub fn new(drain_time: Duration) -> Self {
        Self {
            drain_time,
            stats: Arc::new(FakeServiceStats::default()),
        }
    }
}

impl ManagedService for FakeService {
    fn name(&self) -> &str {
        "fake"
    }

    fn run_async(&mut self) {
        self.stats.starts.fetch_add(1, Ordering::SeqCst);
    }

    async fn shutdown(&mut self, ctx: &ShutdownContext) -> Result<(), ServiceError> {
        self.stats.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.stats
            .remaining_at_call
            .lock()
            .unwrap()
            .push(ctx.remaining());

        ctx.run(tokio::time::sleep(self.drain_time))
            .await
            .map_err(|e| ServiceError::DeadlineExceeded {
                grace_ms: e.grace.as_millis() as u64,
            })
    }
}
