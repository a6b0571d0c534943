//! In-process event bus delivering error events to registered consumers.
//!
//! Producers publish through [`EventBusHandle::publish`], which never blocks:
//! when the bounded channel is full the event is refused with
//! [`BusError::Full`]. A tokio task drains the channel and hands every event
//! to every consumer on the blocking pool, so a slow transport never stalls
//! the runtime. Consumers that support batching receive events in groups of
//! up to `batch_size`, or whatever has accumulated after `batch_timeout`.
//!
//! Each event is shared between consumers behind an `Arc`, so the
//! already-reported flag set by one consumer is seen by the others.

use crate::application::ports::{DeliveryError, EventConsumer};
use crate::domain::event::ErrorEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// Default number of events buffered between producers and consumers.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Why an event could not be published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    /// The bus has been shut down
    #[error("event bus is closed")]
    Closed,
    /// The channel is saturated; the event was dropped
    #[error("event bus is full")]
    Full,
}

/// Event bus under construction.
///
/// # Example
/// ```
/// use error_telemetry::{ErrorCategory, ErrorEvent, EventBus, TelemetryWorker, TracingTransport, WorkerConfig};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let worker = Arc::new(TelemetryWorker::new(WorkerConfig::default(), TracingTransport::new()));
///
/// let mut bus = EventBus::new(256);
/// bus.register(worker.clone());
/// let handle = bus.start();
///
/// handle
///     .publish(ErrorEvent::new("rtsp", ErrorCategory::Rtsp, "stream closed"))
///     .unwrap();
/// handle.shutdown().await;
///
/// assert_eq!(worker.stats().processed, 1);
/// # }
/// ```
pub struct EventBus {
    capacity: usize,
    batch_size: usize,
    batch_timeout: Duration,
    consumers: Vec<Arc<dyn EventConsumer>>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            batch_size: 10,
            batch_timeout: Duration::from_secs(5),
            consumers: Vec::new(),
        }
    }

    /// Set how batching consumers are fed.
    ///
    /// A batch is dispatched once it holds `size` events or `timeout` after
    /// its first event arrived, whichever comes first.
    pub fn with_batching(mut self, size: usize, timeout: Duration) -> Self {
        self.batch_size = size.max(1);
        self.batch_timeout = timeout;
        self
    }

    /// Add a consumer. Every consumer sees every event.
    pub fn register(&mut self, consumer: Arc<dyn EventConsumer>) {
        debug!(consumer = consumer.name(), "event consumer registered");
        self.consumers.push(consumer);
    }

    /// Number of registered consumers.
    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Spawn the dispatch task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> EventBusHandle {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let (batched, single): (Vec<_>, Vec<_>) = self
            .consumers
            .into_iter()
            .partition(|c| c.supports_batching());

        let dispatcher = Dispatcher {
            receiver,
            single,
            batched,
            batch_size: self.batch_size,
            batch_timeout: self.batch_timeout,
            pending: Vec::new(),
        };

        EventBusHandle {
            sender: Some(sender),
            rejected: Arc::new(AtomicU64::new(0)),
            task: tokio::spawn(dispatcher.run()),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.consumers.iter().map(|c| c.name()).collect();
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("batch_size", &self.batch_size)
            .field("batch_timeout", &self.batch_timeout)
            .field("consumers", &names)
            .finish()
    }
}

/// Publishing side of a running [`EventBus`].
#[derive(Debug)]
pub struct EventBusHandle {
    sender: Option<mpsc::Sender<Arc<ErrorEvent>>>,
    rejected: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl EventBusHandle {
    /// Publish an event without waiting.
    ///
    /// # Errors
    ///
    /// [`BusError::Full`] if the channel is saturated, [`BusError::Closed`]
    /// if the dispatch task is gone. The event is dropped either way.
    pub fn publish(&self, event: ErrorEvent) -> Result<(), BusError> {
        let sender = self.sender.as_ref().ok_or(BusError::Closed)?;
        sender.try_send(Arc::new(event)).map_err(|e| {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            match e {
                mpsc::error::TrySendError::Full(_) => BusError::Full,
                mpsc::error::TrySendError::Closed(_) => BusError::Closed,
            }
        })
    }

    /// Events refused by `publish` so far.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Close the channel and wait until every queued event has been delivered.
    pub async fn shutdown(mut self) {
        self.sender.take();
        if let Err(e) = (&mut self.task).await {
            error!(error = %e, "event bus dispatch task failed");
        }
    }
}

struct Dispatcher {
    receiver: mpsc::Receiver<Arc<ErrorEvent>>,
    single: Vec<Arc<dyn EventConsumer>>,
    batched: Vec<Arc<dyn EventConsumer>>,
    batch_size: usize,
    batch_timeout: Duration,
    pending: Vec<Arc<ErrorEvent>>,
}

impl Dispatcher {
    async fn run(mut self) {
        let mut deadline = Instant::now();

        loop {
            let next = if self.pending.is_empty() {
                self.receiver.recv().await
            } else {
                match tokio::time::timeout_at(deadline, self.receiver.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        self.flush_batch().await;
                        continue;
                    }
                }
            };

            let Some(event) = next else { break };

            dispatch_single(&self.single, &event).await;

            if !self.batched.is_empty() {
                if self.pending.is_empty() {
                    deadline = Instant::now() + self.batch_timeout;
                }
                self.pending.push(event);
                if self.pending.len() >= self.batch_size {
                    self.flush_batch().await;
                }
            }
        }

        self.flush_batch().await;
        debug!("event bus stopped");
    }

    async fn flush_batch(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let batch: Arc<[Arc<ErrorEvent>]> = std::mem::take(&mut self.pending).into();

        let tasks: Vec<_> = self
            .batched
            .iter()
            .map(|consumer| {
                let consumer = Arc::clone(consumer);
                let batch = Arc::clone(&batch);
                tokio::task::spawn_blocking(move || {
                    let result = consumer.process_batch(&batch);
                    (consumer, result)
                })
            })
            .collect();

        for task in tasks {
            log_outcome(task.await, batch.len());
        }
    }
}

async fn dispatch_single(consumers: &[Arc<dyn EventConsumer>], event: &Arc<ErrorEvent>) {
    let tasks: Vec<_> = consumers
        .iter()
        .map(|consumer| {
            let consumer = Arc::clone(consumer);
            let event = Arc::clone(event);
            tokio::task::spawn_blocking(move || {
                let result = consumer.process_event(&event);
                (consumer, result)
            })
        })
        .collect();

    for task in tasks {
        log_outcome(task.await, 1);
    }
}

type Outcome = (Arc<dyn EventConsumer>, Result<(), DeliveryError>);

fn log_outcome(joined: Result<Outcome, tokio::task::JoinError>, size: usize) {
    match joined {
        Ok((_, Ok(()))) => {}
        Ok((consumer, Err(e))) => {
            warn!(consumer = consumer.name(), size, error = %e, "event consumer failed");
        }
        Err(e) => {
            error!(error = %e, "event consumer panicked");
        }
    }
}
