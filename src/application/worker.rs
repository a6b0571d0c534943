//! The telemetry worker: gating pipeline in front of the transport.
//!
//! [`TelemetryWorker::process_event`] applies, in order and stopping at the
//! first rejection:
//!
//! 1. the reporting switch
//! 2. the circuit breaker
//! 3. the rate limiter, keyed by component (or globally)
//! 4. deterministic sampling
//! 5. the already-reported check (a silent no-op)
//! 6. the operational-noise filter
//! 7. scrubbing into a [`DiagnosticReport`] and delivery to the transport
//!
//! A delivery error counts as failed and as a breaker failure. A delivery
//! that succeeds but takes longer than the slow threshold still counts as
//! processed, and also as a breaker failure.
//!
//! Nothing here blocks beyond the transport call, and nothing panics or
//! propagates to the code that produced the error.

use crate::application::circuit_breaker::CircuitBreaker;
use crate::application::config::{validate_sampling_rate, ConfigError, WorkerConfig};
use crate::application::deferred::DeferredQueue;
use crate::application::ports::{Clock, DeliveryError, EventConsumer, Transport, TransportError};
use crate::application::rate_limiter::RateLimiter;
use crate::application::stats::{DropReason, Stats, StatsSnapshot};
use crate::application::switch::ReportingSwitch;
use crate::domain::category::Severity;
use crate::domain::event::ErrorEvent;
use crate::domain::privacy::PrivacyScrubber;
use crate::domain::report::{is_operational_noise, DiagnosticReport};
use crate::domain::sampler::Sampler;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::storage::ShardedStorage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Name the worker registers under unless told otherwise.
pub const DEFAULT_WORKER_NAME: &str = "telemetry-worker";

/// Gating pipeline forwarding admitted error events to a [`Transport`].
///
/// The worker exclusively owns its circuit breaker, rate limiter and
/// statistics. Each component synchronizes itself, so concurrent calls never
/// serialize on more than one component at a time.
///
/// # Example
/// ```
/// use error_telemetry::{ErrorCategory, ErrorEvent, TelemetryWorker, TracingTransport, WorkerConfig};
///
/// let worker = TelemetryWorker::new(WorkerConfig::default(), TracingTransport::new());
/// let event = ErrorEvent::new("rtsp", ErrorCategory::Rtsp, "stream closed by peer");
///
/// worker.process_event(&event).unwrap();
/// assert!(event.is_reported());
/// assert_eq!(worker.stats().processed, 1);
/// ```
#[derive(Debug)]
pub struct TelemetryWorker {
    name: String,
    config: WorkerConfig,
    switch: ReportingSwitch,
    circuit_breaker: Arc<CircuitBreaker>,
    rate_limiter: RateLimiter,
    sampler: Sampler,
    sampling_rate: AtomicU64,
    scrubber: PrivacyScrubber,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    stats: Stats,
    deferred: Option<DeferredQueue>,
}

impl TelemetryWorker {
    /// Create a worker on the system clock.
    pub fn new(config: WorkerConfig, transport: impl Transport + 'static) -> Self {
        Self::with_clock(config, transport, Arc::new(SystemClock::new()))
    }

    /// Create a worker reading time from `clock`.
    ///
    /// The clock drives the circuit breaker, the rate limiter and the
    /// slow-delivery measurement.
    pub fn with_clock(
        config: WorkerConfig,
        transport: impl Transport + 'static,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let circuit_breaker = Arc::new(CircuitBreaker::with_clock(
            config.circuit_breaker().clone(),
            Arc::clone(&clock),
        ));
        let rate_limiter = RateLimiter::with_storage(
            Arc::new(ShardedStorage::new()),
            Arc::clone(&clock),
            config.rate_limit_max_events(),
            config.rate_limit_window(),
        )
        .with_compaction_threshold(config.compaction_threshold());
        let scrubber = if config.extended_scrubbing() {
            PrivacyScrubber::new()
        } else {
            PrivacyScrubber::urls_only()
        };

        Self {
            name: DEFAULT_WORKER_NAME.to_string(),
            switch: ReportingSwitch::new(config.enabled()),
            sampling_rate: AtomicU64::new(config.sampling_rate().to_bits()),
            circuit_breaker,
            rate_limiter,
            sampler: Sampler::new(),
            scrubber,
            transport: Arc::new(transport),
            clock,
            stats: Stats::new(),
            deferred: None,
            config,
        }
    }

    /// Set the name used for registration and logging.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Use an externally owned reporting switch.
    ///
    /// The switch keeps its current value; the configured `enabled` flag is
    /// not applied to it.
    pub fn with_switch(mut self, switch: ReportingSwitch) -> Self {
        self.switch = switch;
        self
    }

    /// Buffer captured messages in `queue` until [`transport_ready`](Self::transport_ready).
    pub fn with_deferred(mut self, queue: DeferredQueue) -> Self {
        self.deferred = Some(queue);
        self
    }

    /// Run one event through the pipeline.
    ///
    /// Only transport failures produce an error, and only so the caller can
    /// log them.
    pub fn process_event(&self, event: &ErrorEvent) -> Result<(), DeliveryError> {
        if !self.switch.is_enabled() {
            self.drop_event(event, DropReason::Disabled);
            return Ok(());
        }

        if !self.circuit_breaker.allow() {
            self.drop_event(event, DropReason::CircuitOpen);
            return Ok(());
        }

        let key = self.config.rate_limit_scope().key(event.component());
        if !self.rate_limiter.allow(key) {
            self.drop_event(event, DropReason::RateLimited);
            return Ok(());
        }

        if !self
            .sampler
            .should_sample(event.component(), event.category().as_str(), self.sampling_rate())
        {
            self.drop_event(event, DropReason::Unsampled);
            return Ok(());
        }

        if event.is_reported() {
            return Ok(());
        }

        if is_operational_noise(event) {
            event.mark_reported();
            self.drop_event(event, DropReason::Filtered);
            return Ok(());
        }

        let report = DiagnosticReport::from_event(event, &self.scrubber);
        self.deliver(&report)?;
        event.mark_reported();
        Ok(())
    }

    /// Report a plain message, or queue it if the transport is not ready yet.
    ///
    /// Captured messages honor the reporting switch and the circuit breaker
    /// but are neither rate limited nor sampled.
    pub fn capture_message(
        &self,
        message: &str,
        severity: Severity,
        component: &str,
    ) -> Result<(), DeliveryError> {
        if !self.switch.is_enabled() {
            return Ok(());
        }

        if let Some(queue) = &self.deferred {
            if queue.push(message, severity, component).is_none() {
                debug!(component, "message deferred until transport is ready");
                return Ok(());
            }
        }

        self.send_message(message, severity, component)
    }

    /// Mark the transport ready and deliver every deferred message.
    ///
    /// Returns the number of messages delivered.
    pub fn transport_ready(&self) -> usize {
        let Some(queue) = &self.deferred else {
            return 0;
        };

        let pending = queue.mark_ready_and_drain();
        let total = pending.len();
        let delivered = pending
            .iter()
            .filter(|m| {
                self.switch.is_enabled()
                    && self
                        .send_message(&m.message, m.severity, &m.component)
                        .is_ok()
            })
            .count();

        info!(
            worker = %self.name,
            delivered,
            pending = total,
            overflowed = queue.overflowed(),
            "transport ready, deferred messages processed"
        );
        delivered
    }

    fn send_message(
        &self,
        message: &str,
        severity: Severity,
        component: &str,
    ) -> Result<(), DeliveryError> {
        if !self.circuit_breaker.allow() {
            debug!(component, reason = %DropReason::CircuitOpen, "telemetry message dropped");
            self.stats.record_dropped(DropReason::CircuitOpen);
            return Ok(());
        }
        let report = DiagnosticReport::from_message(message, severity, component, &self.scrubber);
        self.deliver(&report)?;
        Ok(())
    }

    fn deliver(&self, report: &DiagnosticReport) -> Result<(), TransportError> {
        let started = self.clock.now();
        let result = self.transport.send(report);
        let elapsed = self.clock.now().saturating_duration_since(started);

        match result {
            Err(e) => {
                self.stats.record_failed();
                self.circuit_breaker.record_failure();
                error!(
                    worker = %self.name,
                    title = %report.title,
                    error = %e,
                    "failed to deliver telemetry report"
                );
                Err(e)
            }
            Ok(()) => {
                let threshold = self.config.slow_threshold();
                if elapsed > threshold {
                    self.stats.record_slow();
                    self.circuit_breaker.record_failure();
                    warn!(
                        worker = %self.name,
                        elapsed = ?elapsed,
                        threshold = ?threshold,
                        "slow telemetry delivery"
                    );
                } else {
                    self.circuit_breaker.record_success();
                }
                self.stats.record_processed();
                Ok(())
            }
        }
    }

    fn drop_event(&self, event: &ErrorEvent, reason: DropReason) {
        self.stats.record_dropped(reason);
        debug!(
            component = event.component(),
            category = %event.category(),
            reason = %reason,
            "telemetry event dropped"
        );
    }

    /// Switch reporting on or off.
    pub fn set_enabled(&self, enabled: bool) {
        let previous = self.switch.set(enabled);
        if previous != enabled {
            info!(worker = %self.name, enabled, "telemetry reporting toggled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.switch.is_enabled()
    }

    /// Change the sampling rate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSamplingRate` if `rate` is outside `[0, 1]`;
    /// the current rate is kept.
    pub fn update_sampling_rate(&self, rate: f64) -> Result<(), ConfigError> {
        let rate = validate_sampling_rate(rate)?;
        let previous = f64::from_bits(self.sampling_rate.swap(rate.to_bits(), Ordering::AcqRel));
        info!(worker = %self.name, previous, rate, "telemetry sampling rate updated");
        Ok(())
    }

    pub fn sampling_rate(&self) -> f64 {
        f64::from_bits(self.sampling_rate.load(Ordering::Acquire))
    }

    /// Wait up to `timeout` for the transport to deliver buffered reports.
    pub fn flush(&self, timeout: Duration) -> bool {
        self.transport.flush(timeout)
    }

    /// Point-in-time statistics, including the breaker state.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.circuit_breaker.state())
    }

    /// Shared handle on the live counters.
    pub fn counters(&self) -> &Stats {
        &self.stats
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn switch(&self) -> &ReportingSwitch {
        &self.switch
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl EventConsumer for TelemetryWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn process_event(&self, event: &ErrorEvent) -> Result<(), DeliveryError> {
        TelemetryWorker::process_event(self, event)
    }

    fn process_batch(&self, events: &[Arc<ErrorEvent>]) -> Result<(), DeliveryError> {
        let mut first_error = None;
        let mut failed = 0usize;
        for event in events {
            if let Err(e) = TelemetryWorker::process_event(self, event) {
                failed += 1;
                first_error.get_or_insert(e);
            }
        }
        debug!(worker = %self.name, size = events.len(), failed, "telemetry batch processed");
        first_error.map_or(Ok(()), Err)
    }

    fn supports_batching(&self) -> bool {
        self.config.batching_enabled()
    }
}
