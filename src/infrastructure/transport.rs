//! Transport adapters.
//!
//! [`TracingTransport`] hands reports to the `tracing` subscriber instead of a
//! remote backend. It is the transport of choice when telemetry should end
//! up in the application's own logs, and a working default for demos.

use crate::application::ports::{Transport, TransportError};
use crate::domain::category::Severity;
use crate::domain::report::DiagnosticReport;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Target of the events emitted by [`TracingTransport`].
pub const REPORT_TARGET: &str = "error_telemetry::report";

/// Transport emitting every report as a `tracing` event.
///
/// The event level follows the report severity; fatal reports are logged
/// at `ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTransport;

impl TracingTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for TracingTransport {
    fn send(&self, report: &DiagnosticReport) -> Result<(), TransportError> {
        let fingerprint = report.fingerprint.join("|");
        match report.severity {
            Severity::Fatal | Severity::Error => error!(
                target: REPORT_TARGET,
                title = %report.title,
                fingerprint = %fingerprint,
                severity = %report.severity,
                "{}",
                report.message
            ),
            Severity::Warning => warn!(
                target: REPORT_TARGET,
                title = %report.title,
                fingerprint = %fingerprint,
                severity = %report.severity,
                "{}",
                report.message
            ),
            Severity::Info => info!(
                target: REPORT_TARGET,
                title = %report.title,
                fingerprint = %fingerprint,
                severity = %report.severity,
                "{}",
                report.message
            ),
            Severity::Debug => debug!(
                target: REPORT_TARGET,
                title = %report.title,
                fingerprint = %fingerprint,
                severity = %report.severity,
                "{}",
                report.message
            ),
        }
        Ok(())
    }

    fn flush(&self, _timeout: Duration) -> bool {
        true
    }
}

impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    fn send(&self, report: &DiagnosticReport) -> Result<(), TransportError> {
        (**self).send(report)
    }

    fn flush(&self, timeout: Duration) -> bool {
        (**self).flush(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::ErrorCategory;
    use crate::domain::event::ErrorEvent;
    use crate::domain::privacy::PrivacyScrubber;
    use crate::infrastructure::mocks::MockCaptureLayer;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    fn report(category: ErrorCategory) -> DiagnosticReport {
        let event = ErrorEvent::new("audio", category, "device busy");
        DiagnosticReport::from_event(&event, &PrivacyScrubber::new())
    }

    #[test]
    fn test_level_follows_severity() {
        let capture = MockCaptureLayer::new();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        tracing::subscriber::with_default(subscriber, || {
            let transport = TracingTransport::new();
            transport.send(&report(ErrorCategory::Audio)).unwrap();
            transport.send(&report(ErrorCategory::Database)).unwrap();
            transport.send(&report(ErrorCategory::NotFound)).unwrap();
        });

        let levels: Vec<_> = capture.get_captured().iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![Level::WARN, Level::ERROR, Level::INFO]);
    }

    #[test]
    fn test_event_carries_title_and_message() {
        let capture = MockCaptureLayer::new();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        tracing::subscriber::with_default(subscriber, || {
            TracingTransport::new().send(&report(ErrorCategory::Audio)).unwrap();
        });

        let events = capture.get_captured();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "[audio-processing] device busy");
        assert_eq!(
            events[0].fields.get("title").map(String::as_str),
            Some("Audio audio-processing")
        );
    }

    #[test]
    fn test_arc_delegates() {
        let transport: Arc<dyn Transport> = Arc::new(TracingTransport::new());
        assert!(transport.send(&report(ErrorCategory::Generic)).is_ok());
        assert!(transport.flush(Duration::from_millis(10)));
    }
}
