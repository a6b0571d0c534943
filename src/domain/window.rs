//! Sliding-window admission counting.
//!
//! A [`SlidingWindow`] remembers when it admitted events and admits a new one
//! only while fewer than `max_events` admissions fall inside the trailing
//! window.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Decision made by an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    /// The event fits in the window and was recorded
    Admit,
    /// The window is full
    Reject,
}

impl WindowDecision {
    pub fn is_admit(&self) -> bool {
        matches!(self, WindowDecision::Admit)
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, WindowDecision::Reject)
    }
}

/// Timestamps of admissions within a trailing window.
///
/// # Example
/// ```
/// use error_telemetry::SlidingWindow;
/// use std::time::{Duration, Instant};
///
/// let mut window = SlidingWindow::new(2, Duration::from_secs(60));
/// let now = Instant::now();
///
/// assert!(window.register(now).is_admit());
/// assert!(window.register(now).is_admit());
/// assert!(window.register(now).is_reject());
///
/// // Once the window has passed, admissions start again
/// let later = now + Duration::from_secs(60);
/// assert!(window.register(later).is_admit());
/// ```
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    max_events: usize,
    window: Duration,
    admitted: VecDeque<Instant>,
}

impl SlidingWindow {
    /// Create an empty window.
    pub fn new(max_events: usize, window: Duration) -> Self {
        Self {
            max_events,
            window,
            admitted: VecDeque::new(),
        }
    }

    /// Drop admissions that are no longer inside the window ending at `now`.
    ///
    /// An admission at `t` expires once `now - t >= window`.
    pub fn expire(&mut self, now: Instant) {
        while let Some(&oldest) = self.admitted.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }

    /// Register an attempt at `now`, recording it if admitted.
    pub fn register(&mut self, now: Instant) -> WindowDecision {
        self.expire(now);

        if self.admitted.len() < self.max_events {
            // Keep the deque ordered even if callers race with slightly older instants.
            let pos = self.admitted.partition_point(|t| *t <= now);
            self.admitted.insert(pos, now);
            WindowDecision::Admit
        } else {
            WindowDecision::Reject
        }
    }

    /// Number of admissions currently inside the window ending at `now`.
    pub fn count(&self, now: Instant) -> usize {
        self.admitted
            .iter()
            .filter(|t| now.saturating_duration_since(**t) < self.window)
            .count()
    }

    /// Whether any admission is still inside the window ending at `now`.
    pub fn is_active(&self, now: Instant) -> bool {
        self.admitted
            .back()
            .is_some_and(|last| now.saturating_duration_since(*last) < self.window)
    }

    /// Forget all admissions.
    pub fn reset(&mut self) {
        self.admitted.clear();
    }
}
