//! Sliding-window rate limiting of telemetry events.
//!
//! Each key owns a [`SlidingWindow`] held in a [`Storage`]. Keys are
//! component names by default ([`RateLimitScope::PerComponent`]) or one
//! shared key ([`RateLimitScope::Global`]).

use crate::application::ports::{Clock, Storage};
use crate::domain::window::SlidingWindow;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::storage::ShardedStorage;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Key used by every event under [`RateLimitScope::Global`].
pub const GLOBAL_KEY: &str = "__global__";

/// How events are grouped for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// One window shared by all events
    Global,
    /// One window per component
    #[default]
    PerComponent,
}

impl RateLimitScope {
    /// Key an event with this component is counted under.
    pub fn key<'a>(&self, component: &'a str) -> &'a str {
        match self {
            RateLimitScope::Global => GLOBAL_KEY,
            RateLimitScope::PerComponent => component,
        }
    }
}

/// Sliding-window admission control, keyed by string.
///
/// Generic over the storage implementation. Keys whose window holds no
/// admission are dropped once the number of keys exceeds the compaction
/// threshold, so memory stays bounded under high key cardinality. After a
/// compaction the trigger moves to twice the surviving key count, so a
/// limiter full of active keys does not rescan on every call.
///
/// # Example
/// ```
/// use error_telemetry::RateLimiter;
/// use std::time::Duration;
///
/// let limiter = RateLimiter::new(2, Duration::from_secs(60));
///
/// assert!(limiter.allow("audio"));
/// assert!(limiter.allow("audio"));
/// assert!(!limiter.allow("audio"));
///
/// // Other keys have their own window
/// assert!(limiter.allow("rtsp"));
/// ```
#[derive(Debug)]
pub struct RateLimiter<S = Arc<ShardedStorage<String, SlidingWindow>>>
where
    S: Storage<String, SlidingWindow>,
{
    storage: S,
    clock: Arc<dyn Clock>,
    max_events: usize,
    window: Duration,
    compaction_threshold: usize,
    next_compaction: AtomicUsize,
}

/// Default number of keys above which idle keys are compacted away.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 1000;

impl RateLimiter {
    /// Create a limiter backed by sharded storage and the system clock.
    pub fn new(max_events: usize, window: Duration) -> Self {
        Self::with_storage(
            Arc::new(ShardedStorage::new()),
            Arc::new(SystemClock::new()),
            max_events,
            window,
        )
    }
}

impl<S> RateLimiter<S>
where
    S: Storage<String, SlidingWindow>,
{
    /// Create a limiter on explicit storage and clock.
    pub fn with_storage(
        storage: S,
        clock: Arc<dyn Clock>,
        max_events: usize,
        window: Duration,
    ) -> Self {
        Self {
            storage,
            clock,
            max_events,
            window,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
            next_compaction: AtomicUsize::new(DEFAULT_COMPACTION_THRESHOLD),
        }
    }

    /// Set the number of keys above which idle keys are dropped.
    pub fn with_compaction_threshold(mut self, threshold: usize) -> Self {
        self.compaction_threshold = threshold;
        self.next_compaction = AtomicUsize::new(threshold);
        self
    }

    /// Register an attempt for `key`, returning whether it is admitted.
    pub fn allow(&self, key: &str) -> bool {
        let now = self.clock.now();
        let (max_events, window) = (self.max_events, self.window);

        let admitted = self.storage.with_entry_mut(
            key.to_string(),
            || SlidingWindow::new(max_events, window),
            |state| state.register(now).is_admit(),
        );

        if self.storage.len() > self.next_compaction.load(Ordering::Relaxed) {
            self.compact();
        }

        admitted
    }

    /// Drop every key with no admission inside the current window.
    pub fn compact(&self) {
        let now = self.clock.now();
        self.storage.retain(|_, window| {
            window.expire(now);
            window.is_active(now)
        });
        let survivors = self.storage.len();
        self.next_compaction.store(
            self.compaction_threshold.max(survivors.saturating_mul(2)),
            Ordering::Relaxed,
        );
    }

    /// Number of keys currently tracked.
    pub fn key_count(&self) -> usize {
        self.storage.len()
    }

    /// Forget all keys.
    pub fn clear(&self) {
        self.storage.clear();
        self.next_compaction
            .store(self.compaction_threshold, Ordering::Relaxed);
    }

    pub fn max_events(&self) -> usize {
        self.max_events
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
