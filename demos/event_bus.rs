//! Event bus example: producers publish, a worker delivers in the background.
//!
//! The producer loop never waits on the backend. A flaky transport trips the
//! circuit breaker, and later events are dropped instead of piling up.

use error_telemetry::{
    DiagnosticReport, ErrorCategory, ErrorEvent, EventBus, TelemetryWorker, Transport,
    TransportError, WorkerConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::prelude::*;

/// Backend that goes down after four reports.
#[derive(Debug, Default)]
struct FlakyBackend {
    calls: AtomicUsize,
}

impl Transport for FlakyBackend {
    fn send(&self, report: &DiagnosticReport) -> Result<(), TransportError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if call > 4 {
            return Err(TransportError::Rejected {
                status: 503,
                reason: "backend overloaded".into(),
            });
        }
        println!("  -> delivered: {} ({})", report.title, report.message);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::builder()
        .with_failure_threshold(2)
        .with_recovery_timeout(Duration::from_secs(30))
        .with_batching(false, 1, Duration::from_secs(1))
        .build()
        .expect("valid config");
    let worker = Arc::new(TelemetryWorker::new(config, FlakyBackend::default()));

    let mut bus = EventBus::new(256);
    bus.register(worker.clone());
    let handle = bus.start();

    println!("=== Event Bus Example ===\n");
    for i in 0..12 {
        let event = ErrorEvent::new(
            format!("camera-{}", i % 4),
            ErrorCategory::Network,
            format!("frame fetch from https://cam{}.example.net/snapshot timed out", i),
        );
        if let Err(e) = handle.publish(event) {
            println!("  publish refused: {}", e);
        }
    }

    handle.shutdown().await;

    let stats = worker.stats();
    println!("\n=== Statistics ===");
    println!("processed:     {}", stats.processed);
    println!("failed:        {}", stats.failed);
    println!("circuit open:  {}", stats.drops.circuit_open);
    println!("circuit state: {}", stats.circuit_state);
}
