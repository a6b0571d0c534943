//! Messages captured before the transport is ready.
//!
//! During startup, code may want to report something before the backend
//! client exists. Those messages wait in a bounded [`DeferredQueue`] and are
//! drained, in capture order, once the transport becomes available.

use crate::application::config::ConfigError;
use crate::domain::category::Severity;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::SystemTime;

/// A message waiting for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredMessage {
    pub message: String,
    pub severity: Severity,
    pub component: String,
    pub captured_at: SystemTime,
}

#[derive(Debug)]
struct QueueState {
    ready: bool,
    messages: VecDeque<DeferredMessage>,
    overflowed: u64,
}

/// Bounded queue of deferred messages.
///
/// When full, the oldest message is discarded to make room.
///
/// # Example
/// ```
/// use error_telemetry::{DeferredQueue, Severity};
///
/// let queue = DeferredQueue::new(8).unwrap();
/// assert!(queue.push("starting", Severity::Info, "main").is_none());
///
/// let drained = queue.mark_ready_and_drain();
/// assert_eq!(drained.len(), 1);
///
/// // Once ready, messages come straight back for immediate delivery
/// assert!(queue.push("late", Severity::Info, "main").is_some());
/// ```
#[derive(Debug)]
pub struct DeferredQueue {
    capacity: usize,
    state: Mutex<QueueState>,
}

impl DeferredQueue {
    /// Create an empty, not yet ready queue.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroDeferredCapacity` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroDeferredCapacity);
        }
        Ok(Self {
            capacity,
            state: Mutex::new(QueueState {
                ready: false,
                messages: VecDeque::with_capacity(capacity),
                overflowed: 0,
            }),
        })
    }

    /// Queue a message, or hand it back if the transport is already ready.
    ///
    /// Returns `None` when the message was queued.
    pub fn push(
        &self,
        message: impl Into<String>,
        severity: Severity,
        component: impl Into<String>,
    ) -> Option<DeferredMessage> {
        let deferred = DeferredMessage {
            message: message.into(),
            severity,
            component: component.into(),
            captured_at: SystemTime::now(),
        };

        let mut state = self.state.lock();
        if state.ready {
            return Some(deferred);
        }
        if state.messages.len() >= self.capacity {
            state.messages.pop_front();
            state.overflowed += 1;
        }
        state.messages.push_back(deferred);
        None
    }

    /// Mark the transport ready and take every queued message, oldest first.
    pub fn mark_ready_and_drain(&self) -> Vec<DeferredMessage> {
        let mut state = self.state.lock();
        state.ready = true;
        state.messages.drain(..).collect()
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    /// Messages currently waiting.
    pub fn len(&self) -> usize {
        self.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Messages discarded because the queue was full.
    pub fn overflowed(&self) -> u64 {
        self.state.lock().overflowed
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            DeferredQueue::new(0).unwrap_err(),
            ConfigError::ZeroDeferredCapacity
        );
    }

    #[test]
    fn test_drains_in_capture_order() {
        let queue = DeferredQueue::new(4).unwrap();
        queue.push("one", Severity::Info, "a");
        queue.push("two", Severity::Warning, "b");
        assert_eq!(queue.len(), 2);
        assert!(!queue.is_ready());

        let drained = queue.mark_ready_and_drain();
        let messages: Vec<_> = drained.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(messages, ["one", "two"]);
        assert_eq!(drained[1].severity, Severity::Warning);
        assert_eq!(drained[1].component, "b");
        assert!(queue.is_empty());
        assert!(queue.is_ready());
    }

    #[test]
    fn test_full_queue_drops_oldest() {
        let queue = DeferredQueue::new(2).unwrap();
        for message in ["one", "two", "three"] {
            assert!(queue.push(message, Severity::Info, "a").is_none());
        }

        assert_eq!(queue.overflowed(), 1);
        let messages: Vec<_> = queue
            .mark_ready_and_drain()
            .into_iter()
            .map(|m| m.message)
            .collect();
        assert_eq!(messages, ["two", "three"]);
    }

    #[test]
    fn test_push_after_ready_returns_message() {
        let queue = DeferredQueue::new(2).unwrap();
        queue.mark_ready_and_drain();

        let returned = queue.push("now", Severity::Error, "a").unwrap();
        assert_eq!(returned.message, "now");
        assert!(queue.is_empty());
        assert!(queue.mark_ready_and_drain().is_empty());
    }
}
