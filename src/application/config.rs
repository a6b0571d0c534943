//! Worker configuration.
//!
//! [`WorkerConfig`] is validated once, when it is built. Nothing on the
//! event path re-checks it.

use crate::application::circuit_breaker::CircuitBreakerConfig;
use crate::application::rate_limiter::{RateLimitScope, DEFAULT_COMPACTION_THRESHOLD};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("failure threshold must be at least 1")]
    ZeroFailureThreshold,
    #[error("half-open max events must be at least 1")]
    ZeroHalfOpenMaxEvents,
    #[error("rate limit window must be greater than 0")]
    ZeroRateLimitWindow,
    #[error("sampling rate must be within [0, 1], got {0}")]
    InvalidSamplingRate(f64),
    #[error("deferred queue capacity must be greater than 0")]
    ZeroDeferredCapacity,
}

/// Check a sampling rate.
pub fn validate_sampling_rate(rate: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidSamplingRate(rate))
    }
}

/// Validated configuration of a telemetry worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub(crate) enabled: bool,
    pub(crate) circuit_breaker: CircuitBreakerConfig,
    pub(crate) rate_limit_window: Duration,
    pub(crate) rate_limit_max_events: usize,
    pub(crate) rate_limit_scope: RateLimitScope,
    pub(crate) compaction_threshold: usize,
    pub(crate) sampling_rate: f64,
    pub(crate) slow_threshold: Duration,
    pub(crate) batching_enabled: bool,
    pub(crate) batch_size: usize,
    pub(crate) batch_timeout: Duration,
    pub(crate) extended_scrubbing: bool,
}

impl WorkerConfig {
    /// Create a builder starting from the defaults.
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn circuit_breaker(&self) -> &CircuitBreakerConfig {
        &self.circuit_breaker
    }

    pub fn rate_limit_window(&self) -> Duration {
        self.rate_limit_window
    }

    pub fn rate_limit_max_events(&self) -> usize {
        self.rate_limit_max_events
    }

    pub fn rate_limit_scope(&self) -> RateLimitScope {
        self.rate_limit_scope
    }

    pub fn compaction_threshold(&self) -> usize {
        self.compaction_threshold
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn slow_threshold(&self) -> Duration {
        self.slow_threshold
    }

    /// Batching is advisory: batch and single-event delivery make the
    /// same admission decisions.
    pub fn batching_enabled(&self) -> bool {
        self.batching_enabled
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn batch_timeout(&self) -> Duration {
        self.batch_timeout
    }

    pub fn extended_scrubbing(&self) -> bool {
        self.extended_scrubbing
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            circuit_breaker: CircuitBreakerConfig::default(),
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max_events: 100,
            rate_limit_scope: RateLimitScope::PerComponent,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
            sampling_rate: 1.0,
            slow_threshold: Duration::from_millis(100),
            batching_enabled: true,
            batch_size: 10,
            batch_timeout: Duration::from_secs(5),
            extended_scrubbing: true,
        }
    }
}

/// Builder for [`WorkerConfig`].
///
/// # Example
/// ```
/// use error_telemetry::{ConfigError, WorkerConfig};
/// use std::time::Duration;
///
/// let config = WorkerConfig::builder()
///     .with_failure_threshold(3)
///     .with_rate_limit(20, Duration::from_secs(10))
///     .with_sampling_rate(0.5)
///     .build()
///     .unwrap();
/// assert_eq!(config.sampling_rate(), 0.5);
///
/// let err = WorkerConfig::builder().with_sampling_rate(1.5).build().unwrap_err();
/// assert_eq!(err, ConfigError::InvalidSamplingRate(1.5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    /// Set whether reporting starts enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Set the consecutive failures needed to open the circuit.
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.config.circuit_breaker.failure_threshold = threshold;
        self
    }

    /// Set how long the circuit stays open before probing.
    pub fn with_recovery_timeout(mut self, timeout: Duration) -> Self {
        self.config.circuit_breaker.recovery_timeout = timeout;
        self
    }

    /// Set the half-open probe cap and the successes needed to close.
    pub fn with_half_open_max_events(mut self, max_events: u32) -> Self {
        self.config.circuit_breaker.half_open_max_events = max_events;
        self
    }

    /// Set the sliding-window bound.
    pub fn with_rate_limit(mut self, max_events: usize, window: Duration) -> Self {
        self.config.rate_limit_max_events = max_events;
        self.config.rate_limit_window = window;
        self
    }

    pub fn with_rate_limit_scope(mut self, scope: RateLimitScope) -> Self {
        self.config.rate_limit_scope = scope;
        self
    }

    /// Set the number of tracked keys above which idle keys are dropped.
    pub fn with_compaction_threshold(mut self, threshold: usize) -> Self {
        self.config.compaction_threshold = threshold;
        self
    }

    /// Set the sampling rate. Validated in [`build`](Self::build).
    pub fn with_sampling_rate(mut self, rate: f64) -> Self {
        self.config.sampling_rate = rate;
        self
    }

    /// Set the latency above which a successful send counts as a breaker failure.
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.config.slow_threshold = threshold;
        self
    }

    pub fn with_batching(mut self, enabled: bool, size: usize, timeout: Duration) -> Self {
        self.config.batching_enabled = enabled;
        self.config.batch_size = size;
        self.config.batch_timeout = timeout;
        self
    }

    /// Scrub e-mails, UUIDs, IPs, tokens and coordinates, not only URLs.
    pub fn with_extended_scrubbing(mut self, extended: bool) -> Self {
        self.config.extended_scrubbing = extended;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a threshold or window is zero, or the
    /// sampling rate is outside `[0, 1]`.
    pub fn build(self) -> Result<WorkerConfig, ConfigError> {
        let config = self.config;
        if config.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigError::ZeroFailureThreshold);
        }
        if config.circuit_breaker.half_open_max_events == 0 {
            return Err(ConfigError::ZeroHalfOpenMaxEvents);
        }
        if config.rate_limit_window.is_zero() {
            return Err(ConfigError::ZeroRateLimitWindow);
        }
        validate_sampling_rate(config.sampling_rate)?;
        Ok(config)
    }
}

/// Serializable worker settings, e.g. loaded from a JSON or TOML file.
///
/// Durations are in milliseconds. Every field is optional and falls back
/// to the default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub enabled: bool,
    pub failure_threshold: u32,
    pub recovery_timeout_ms: u64,
    pub half_open_max_events: u32,
    pub rate_limit_window_ms: u64,
    pub rate_limit_max_events: usize,
    pub rate_limit_scope: RateLimitScope,
    pub compaction_threshold: usize,
    pub sampling_rate: f64,
    pub slow_threshold_ms: u64,
    pub batching_enabled: bool,
    pub batch_size: usize,
    pub batch_timeout_ms: u64,
    pub extended_scrubbing: bool,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        let config = WorkerConfig::default();
        let millis = |d: Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        Self {
            enabled: config.enabled,
            failure_threshold: config.circuit_breaker.failure_threshold,
            recovery_timeout_ms: millis(config.circuit_breaker.recovery_timeout),
            half_open_max_events: config.circuit_breaker.half_open_max_events,
            rate_limit_window_ms: millis(config.rate_limit_window),
            rate_limit_max_events: config.rate_limit_max_events,
            rate_limit_scope: config.rate_limit_scope,
            compaction_threshold: config.compaction_threshold,
            sampling_rate: config.sampling_rate,
            slow_threshold_ms: millis(config.slow_threshold),
            batching_enabled: config.batching_enabled,
            batch_size: config.batch_size,
            batch_timeout_ms: millis(config.batch_timeout),
            extended_scrubbing: config.extended_scrubbing,
        }
    }
}

impl TryFrom<WorkerSettings> for WorkerConfig {
    type Error = ConfigError;

    fn try_from(settings: WorkerSettings) -> Result<Self, Self::Error> {
        WorkerConfig::builder()
            .with_enabled(settings.enabled)
            .with_failure_threshold(settings.failure_threshold)
            .with_recovery_timeout(Duration::from_millis(settings.recovery_timeout_ms))
            .with_half_open_max_events(settings.half_open_max_events)
            .with_rate_limit(
                settings.rate_limit_max_events,
                Duration::from_millis(settings.rate_limit_window_ms),
            )
            .with_rate_limit_scope(settings.rate_limit_scope)
            .with_compaction_threshold(settings.compaction_threshold)
            .with_sampling_rate(settings.sampling_rate)
            .with_slow_threshold(Duration::from_millis(settings.slow_threshold_ms))
            .with_batching(
                settings.batching_enabled,
                settings.batch_size,
                Duration::from_millis(settings.batch_timeout_ms),
            )
            .with_extended_scrubbing(settings.extended_scrubbing)
            .build()
    }
}
