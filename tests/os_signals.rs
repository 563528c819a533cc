//! Real OS signal delivery.
//!
//! Signals go to the whole process, so these tests live in their own binary.

#![cfg(unix)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use trunk_service::lifecycle::{wait_for_shutdown, wait_for_termination_signal, Trigger};

async fn send_to_self(signal: &str) {
    let status = Command::new("kill")
        .arg(format!("-{signal}"))
        .arg(std::process::id().to_string())
        .status()
        .await
        .expect("kill should run");
    assert!(status.success(), "kill -{signal} failed: {status}");
}

#[tokio::test]
async fn test_sigterm_runs_cleanup_once() {
    let root = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let grace_seen = Arc::new(Mutex::new(None));

    let counted = calls.clone();
    let recorded = grace_seen.clone();
    let handle = tokio::spawn(async move {
        wait_for_shutdown(&root, 300, move |ctx| async move {
            counted.fetch_add(1, Ordering::SeqCst);
            *recorded.lock().unwrap() = Some(ctx.grace());

            // Repeated signals during cleanup are swallowed.
            send_to_self("TERM").await;
            send_to_self("INT").await;
            tokio::time::sleep(Duration::from_millis(50)).await;
        })
        .await
    });

    // Give the coordinator time to install its handlers.
    tokio::time::sleep(Duration::from_millis(100)).await;
    send_to_self("TERM").await;

    let report = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("coordinator should return after SIGTERM")
        .unwrap();

    assert_eq!(report.trigger, Trigger::Signal);
    assert_eq!(report.grace, Duration::from_millis(300));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*grace_seen.lock().unwrap(), Some(Duration::from_millis(300)));
}

#[tokio::test]
async fn test_signal_wait_honors_cancelled_root() {
    let root = CancellationToken::new();
    root.cancel();

    let trigger = tokio::time::timeout(Duration::from_secs(1), wait_for_termination_signal(&root))
        .await
        .expect("cancelled root should end the wait");
    assert_eq!(trigger, Trigger::RootCancelled);
}
