//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::domain::event::ErrorEvent;
use crate::domain::report::DiagnosticReport;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Port for obtaining current time.
///
/// This abstraction allows the application layer to work with time
/// without depending on system clock implementation details.
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Failure reported by a transport while sending a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The backend cannot be reached
    #[error("telemetry backend unavailable")]
    Unavailable,
    /// The backend answered but refused the report
    #[error("telemetry backend rejected report (status {status}): {reason}")]
    Rejected { status: u16, reason: String },
    /// The send did not complete in time
    #[error("telemetry send timed out after {0:?}")]
    Timeout(Duration),
    #[error("telemetry transport error: {0}")]
    Other(String),
}

/// Port for the remote telemetry backend.
///
/// The pipeline never retries; a transport that wants retries does them
/// inside `send`.
pub trait Transport: Send + Sync + Debug {
    /// Send one report.
    fn send(&self, report: &DiagnosticReport) -> Result<(), TransportError>;

    /// Wait up to `timeout` for buffered reports to be delivered.
    ///
    /// Returns `true` if everything was delivered in time.
    fn flush(&self, _timeout: Duration) -> bool {
        true
    }
}

/// Failure to deliver an event, returned to the bus for logging only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Port through which an event bus hands events to a subscriber.
pub trait EventConsumer: Send + Sync {
    /// Stable identifier used for registration and logging.
    fn name(&self) -> &str;

    /// Process exactly one event.
    fn process_event(&self, event: &ErrorEvent) -> Result<(), DeliveryError>;

    /// Process events independently of each other.
    ///
    /// A failing event does not stop the rest of the batch; the first
    /// error is returned once every event has been handled.
    fn process_batch(&self, events: &[Arc<ErrorEvent>]) -> Result<(), DeliveryError> {
        let mut first_error = None;
        for event in events {
            if let Err(e) = self.process_event(event) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Whether batch delivery is worthwhile for this consumer.
    fn supports_batching(&self) -> bool {
        false
    }
}

/// Port for concurrent key-value storage.
///
/// This abstraction allows the application layer to store and retrieve values
/// without depending on specific concurrent data structure implementations.
/// Infrastructure provides concrete implementations (ShardedStorage).
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Access an entry with mutable access, creating it if necessary.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `factory` - Function to create a new value if the key doesn't exist
    /// * `accessor` - Function that gets mutable access to the value
    ///
    /// # Returns
    /// The result from the accessor function
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;

    /// Clear all entries from the storage.
    fn clear(&self);

    /// Remove entries for which the predicate returns false.
    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::ErrorCategory;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailsOnNetwork {
        seen: AtomicUsize,
    }

    impl EventConsumer for FailsOnNetwork {
        fn name(&self) -> &str {
            "fails-on-network"
        }

        fn process_event(&self, event: &ErrorEvent) -> Result<(), DeliveryError> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if *event.category() == ErrorCategory::Network {
                Err(TransportError::Other(event.message().to_string()).into())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_batch_continues_after_failure_and_returns_first_error() {
        let consumer = FailsOnNetwork {
            seen: AtomicUsize::new(0),
        };
        let events = vec![
            ErrorEvent::new("a", ErrorCategory::Database, "ok"),
            ErrorEvent::new("b", ErrorCategory::Network, "first"),
            ErrorEvent::new("c", ErrorCategory::Network, "second"),
            ErrorEvent::new("d", ErrorCategory::Audio, "ok"),
        ]
        .into_iter()
        .map(Arc::new)
        .collect::<Vec<_>>();

        let result = consumer.process_batch(&events);

        assert_eq!(consumer.seen.load(Ordering::SeqCst), 4);
        assert_eq!(
            result,
            Err(DeliveryError::Transport(TransportError::Other("first".into())))
        );
        assert!(!consumer.supports_batching());
    }

    #[test]
    fn test_empty_batch_is_ok() {
        let consumer = FailsOnNetwork {
            seen: AtomicUsize::new(0),
        };
        assert_eq!(consumer.process_batch(&[]), Ok(()));
    }

    #[test]
    fn test_transport_error_messages() {
        let err = TransportError::Rejected {
            status: 429,
            reason: "quota".into(),
        };
        assert_eq!(
            err.to_string(),
            "telemetry backend rejected report (status 429): quota"
        );
        let delivery: DeliveryError = TransportError::Unavailable.into();
        assert_eq!(delivery.to_string(), "telemetry backend unavailable");
    }
}
