//! Outcome counters for the telemetry pipeline.
//!
//! All counters are monotonically increasing between resets and use
//! atomic operations, so they can be read at any time without locking.

use crate::application::circuit_breaker::CircuitState;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Why an event was dropped before reaching the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Reporting is switched off
    Disabled,
    /// The circuit breaker refused the delivery
    CircuitOpen,
    /// The rate limiter refused the event
    RateLimited,
    /// The event fell outside the sampling rate
    Unsampled,
    /// The event is an operational problem not worth reporting
    Filtered,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::Disabled => "disabled",
            DropReason::CircuitOpen => "circuit_open",
            DropReason::RateLimited => "rate_limited",
            DropReason::Unsampled => "unsampled",
            DropReason::Filtered => "filtered",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline statistics shared between a worker and its observers.
///
/// Cloning is cheap; clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    inner: Arc<StatsInner>,
}

#[derive(Debug, Default)]
struct StatsInner {
    processed: AtomicU64,
    failed: AtomicU64,
    slow: AtomicU64,
    dropped_disabled: AtomicU64,
    dropped_circuit_open: AtomicU64,
    dropped_rate_limited: AtomicU64,
    dropped_unsampled: AtomicU64,
    dropped_filtered: AtomicU64,
}

impl StatsInner {
    fn drop_counter(&self, reason: DropReason) -> &AtomicU64 {
        match reason {
            DropReason::Disabled => &self.dropped_disabled,
            DropReason::CircuitOpen => &self.dropped_circuit_open,
            DropReason::RateLimited => &self.dropped_rate_limited,
            DropReason::Unsampled => &self.dropped_unsampled,
            DropReason::Filtered => &self.dropped_filtered,
        }
    }
}

impl Stats {
    /// Create a new stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_processed(&self) {
        self.inner.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.inner.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_slow(&self) {
        self.inner.slow.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self, reason: DropReason) {
        self.inner.drop_counter(reason).fetch_add(1, Ordering::Relaxed);
    }

    /// Events delivered to the transport.
    pub fn processed(&self) -> u64 {
        self.inner.processed.load(Ordering::Relaxed)
    }

    /// Events whose delivery errored.
    pub fn failed(&self) -> u64 {
        self.inner.failed.load(Ordering::Relaxed)
    }

    /// Deliveries that succeeded above the slow threshold.
    pub fn slow(&self) -> u64 {
        self.inner.slow.load(Ordering::Relaxed)
    }

    /// Events dropped for one reason.
    pub fn dropped_for(&self, reason: DropReason) -> u64 {
        self.inner.drop_counter(reason).load(Ordering::Relaxed)
    }

    /// Events dropped for any reason.
    pub fn dropped(&self) -> u64 {
        self.drops().total()
    }

    fn drops(&self) -> DropCounts {
        DropCounts {
            disabled: self.dropped_for(DropReason::Disabled),
            circuit_open: self.dropped_for(DropReason::CircuitOpen),
            rate_limited: self.dropped_for(DropReason::RateLimited),
            unsampled: self.dropped_for(DropReason::Unsampled),
            filtered: self.dropped_for(DropReason::Filtered),
        }
    }

    /// Get a snapshot of all counters together with the breaker state.
    pub fn snapshot(&self, circuit_state: CircuitState) -> StatsSnapshot {
        let drops = self.drops();
        StatsSnapshot {
            processed: self.processed(),
            dropped: drops.total(),
            failed: self.failed(),
            slow: self.slow(),
            drops,
            circuit_state,
        }
    }

    /// Reset all counters to zero.
    ///
    /// Useful for testing or when starting a new monitoring period.
    pub fn reset(&self) {
        let inner = &self.inner;
        for counter in [
            &inner.processed,
            &inner.failed,
            &inner.slow,
            &inner.dropped_disabled,
            &inner.dropped_circuit_open,
            &inner.dropped_rate_limited,
            &inner.dropped_unsampled,
            &inner.dropped_filtered,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Drop counts broken down by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    pub disabled: u64,
    pub circuit_open: u64,
    pub rate_limited: u64,
    pub unsampled: u64,
    pub filtered: u64,
}

impl DropCounts {
    pub fn total(&self) -> u64 {
        self.disabled
            .saturating_add(self.circuit_open)
            .saturating_add(self.rate_limited)
            .saturating_add(self.unsampled)
            .saturating_add(self.filtered)
    }
}

/// A point-in-time snapshot of pipeline statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub processed: u64,
    pub dropped: u64,
    pub failed: u64,
    pub slow: u64,
    pub drops: DropCounts,
    pub circuit_state: CircuitState,
}

impl StatsSnapshot {
    /// Fraction of handled events that were dropped (0.0 to 1.0).
    ///
    /// Returns 0.0 if nothing has been handled.
    pub fn drop_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.dropped as f64 / total as f64
        }
    }

    /// Events handled: processed, dropped and failed.
    pub fn total(&self) -> u64 {
        self.processed
            .saturating_add(self.dropped)
            .saturating_add(self.failed)
    }
}
