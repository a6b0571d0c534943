//! Doubles shared by the integration tests.

#![allow(dead_code)]

use error_telemetry::{Clock, DiagnosticReport, Transport, TransportError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Transport that keeps every report it accepts.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    reports: Arc<Mutex<Vec<DiagnosticReport>>>,
    attempts: Arc<Mutex<usize>>,
    failure: Arc<Mutex<Option<TransportError>>>,
    latency: Arc<Mutex<Option<(ManualClock, Duration)>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(&self, error: Option<TransportError>) {
        *self.failure.lock() = error;
    }

    pub fn slow(&self, clock: ManualClock, latency: Duration) {
        *self.latency.lock() = Some((clock, latency));
    }

    pub fn reports(&self) -> Vec<DiagnosticReport> {
        self.reports.lock().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, report: &DiagnosticReport) -> Result<(), TransportError> {
        *self.attempts.lock() += 1;
        if let Some((clock, latency)) = self.latency.lock().as_ref() {
            clock.advance(*latency);
        }
        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }
        self.reports.lock().push(report.clone());
        Ok(())
    }
}

/// Clock moved by hand.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}
