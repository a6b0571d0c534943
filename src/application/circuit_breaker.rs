//! Circuit breaker isolating the pipeline from a failing backend.
//!
//! While the circuit is open no report reaches the transport. After the
//! recovery timeout a limited number of probe deliveries are let through
//! (half-open); enough successes close the circuit again, a single failure
//! reopens it.

use crate::application::ports::Clock;
use crate::infrastructure::clock::SystemClock;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Circuit is closed, deliveries proceed
    Closed,
    /// Circuit is open, deliveries are dropped
    Open,
    /// Circuit is probing whether the backend recovered
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening circuit
    pub failure_threshold: u32,
    /// Duration to wait before attempting recovery
    pub recovery_timeout: Duration,
    /// Successes needed to close from half-open; also the probe cap
    pub half_open_max_events: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 10,
            recovery_timeout: Duration::from_secs(60),
            half_open_max_events: 5,
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    half_open_successes: u32,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure: None,
            half_open_successes: 0,
        }
    }
}

/// Three-state circuit breaker.
///
/// The only legal transitions are Closed→Open, Open→HalfOpen,
/// HalfOpen→Closed and HalfOpen→Open (plus an explicit [`reset`](Self::reset)).
///
/// # Example
/// ```
/// use error_telemetry::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
/// use std::time::Duration;
///
/// let cb = CircuitBreaker::with_config(CircuitBreakerConfig {
///     failure_threshold: 2,
///     recovery_timeout: Duration::from_secs(30),
///     half_open_max_events: 1,
/// });
///
/// cb.record_failure();
/// cb.record_failure();
/// assert_eq!(cb.state(), CircuitState::Open);
/// assert!(!cb.allow());
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerState>,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with default configuration.
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    /// Create a new circuit breaker with custom configuration.
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Create a circuit breaker reading time from `clock`.
    pub fn with_clock(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(BreakerState::closed()),
            config,
            clock,
        }
    }

    /// Get the current circuit state.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Check whether a delivery may proceed.
    ///
    /// An open circuit whose recovery timeout has strictly elapsed moves to
    /// half-open here, and the call that performs the move is admitted.
    pub fn allow(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let now = self.clock.now();
                let recovered = inner.last_failure.map_or(true, |last| {
                    now.saturating_duration_since(last) > self.config.recovery_timeout
                });
                if recovered {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_successes = 0;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => inner.half_open_successes < self.config.half_open_max_events,
        }
    }

    /// Record a successful delivery.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                inner.half_open_successes = inner.half_open_successes.saturating_add(1);
                if inner.half_open_successes >= self.config.half_open_max_events {
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.half_open_successes = 0;
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Record a failed (or too slow) delivery.
    pub fn record_failure(&self) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                if inner.consecutive_failures >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.last_failure = Some(now);
                }
            }
            CircuitState::Open => {
                inner.last_failure = Some(now);
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.consecutive_failures = self.config.failure_threshold;
                inner.half_open_successes = 0;
                inner.last_failure = Some(now);
            }
        }
    }

    /// Get the number of consecutive failures.
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    /// Successes recorded since the circuit went half-open.
    pub fn half_open_successes(&self) -> u32 {
        self.inner.lock().half_open_successes
    }

    /// Reset the circuit breaker to closed state.
    pub fn reset(&self) {
        *self.inner.lock() = BreakerState::closed();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
