//! Recording transport for testing.

use super::clock::MockClock;
use crate::application::ports::{Transport, TransportError};
use crate::domain::report::DiagnosticReport;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Transport that records reports instead of sending them.
///
/// Clones share state, so a test can keep one handle while the worker owns
/// another. Failures and latency are injected through setters.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug)]
struct MockState {
    sent: Vec<DiagnosticReport>,
    attempts: usize,
    failure: Option<TransportError>,
    latency: Option<(MockClock, Duration)>,
    flush_result: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            sent: Vec::new(),
            attempts: 0,
            failure: None,
            latency: None,
            flush_result: true,
        }
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `send` fail with `error`, or succeed on `None`.
    pub fn fail_with(&self, error: Option<TransportError>) {
        self.state.lock().failure = error;
    }

    /// Advance `clock` by `latency` on every `send`, simulating a slow backend.
    pub fn set_latency(&self, clock: MockClock, latency: Duration) {
        self.state.lock().latency = Some((clock, latency));
    }

    /// Result returned by `flush`.
    pub fn set_flush_result(&self, result: bool) {
        self.state.lock().flush_result = result;
    }

    /// Number of `send` calls, failed ones included.
    pub fn send_count(&self) -> usize {
        self.state.lock().attempts
    }

    /// Reports accepted so far.
    pub fn sent(&self) -> Vec<DiagnosticReport> {
        self.state.lock().sent.clone()
    }

    /// Forget recorded reports and attempts.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.sent.clear();
        state.attempts = 0;
    }
}

impl Transport for MockTransport {
    fn send(&self, report: &DiagnosticReport) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.attempts += 1;
        if let Some((clock, latency)) = &state.latency {
            clock.advance(*latency);
        }
        if let Some(error) = &state.failure {
            return Err(error.clone());
        }
        state.sent.push(report.clone());
        Ok(())
    }

    fn flush(&self, _timeout: Duration) -> bool {
        self.state.lock().flush_result
    }
}
