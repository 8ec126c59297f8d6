use crate::domain::NotificationEvent;
use futures::StreamExt;
use futures::stream::BoxStream;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::{BroadcastStream, ReceiverStream};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

#[derive(Clone, Debug)]
struct Metrics {
    published_total: Counter<u64>,
    unrouted_total: Counter<u64>,
    dropped_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("notification-bridge");
        Self {
            published_total: meter
                .u64_counter("bridge_events_published_total")
                .with_description("Total events published on the bridge bus")
                .build(),
            unrouted_total: meter
                .u64_counter("bridge_events_unrouted_total")
                .with_description("Events published while no subscriber was listening")
                .build(),
            dropped_total: meter
                .u64_counter("bridge_events_dropped_total")
                .with_description("Events a full queued subscriber could not take without waiting")
                .build(),
        }
    }
}

/// Item yielded by a bus subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Event(Arc<NotificationEvent>),
    /// The subscriber fell behind and this many events were skipped.
    Lagged(u64),
}

type Queue = mpsc::Sender<Arc<NotificationEvent>>;

/// Fans events out to every subscriber.
///
/// Broadcast subscribers never slow publishers down and skip events when they fall behind.
/// Queued subscribers see every event sent with [`EventBus::send`], which waits for room.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Arc<NotificationEvent>>,
    queues: Arc<Mutex<Vec<Queue>>>,
    capacity: usize,
    metrics: Metrics,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, queues: Arc::new(Mutex::new(Vec::new())), capacity, metrics: Metrics::new() }
    }

    /// Publishes an event without waiting and returns how many subscribers it reached.
    ///
    /// A queued subscriber whose queue is full misses the event.
    pub fn publish(&self, event: impl Into<NotificationEvent>) -> usize {
        let event = Arc::new(event.into());
        let mut reached = self.broadcast(&event);

        for queue in self.open_queues() {
            match queue.try_send(Arc::clone(&event)) {
                Ok(()) => reached += 1,
                Err(TrySendError::Full(_)) => {
                    self.metrics.dropped_total.add(1, &[KeyValue::new("event", event.kind().as_str())]);
                    tracing::warn!(event = %event.kind(), "Queued subscriber is full, event dropped");
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }

        self.record(&event, reached)
    }

    /// Publishes an event, waiting until every queued subscriber has room for it.
    ///
    /// Returns how many subscribers it reached.
    pub async fn send(&self, event: impl Into<NotificationEvent>) -> usize {
        let event = Arc::new(event.into());
        let mut reached = self.broadcast(&event);

        for queue in self.open_queues() {
            if queue.send(Arc::clone(&event)).await.is_ok() {
                reached += 1;
            }
        }

        self.record(&event, reached)
    }

    /// Subscribes to events published from now on. The stream ends once every bus handle is dropped.
    pub fn subscribe(&self) -> BoxStream<'static, Delivery> {
        BroadcastStream::new(self.tx.subscribe()).map(|item| match item {
            Ok(event) => Delivery::Event(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => Delivery::Lagged(skipped),
        })
        .boxed()
    }

    /// Subscribes through a bounded queue that never lags: [`EventBus::send`] waits for it instead.
    ///
    /// The stream ends once every bus handle is dropped.
    pub fn subscribe_queued(&self) -> BoxStream<'static, Delivery> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.queues.lock().unwrap_or_else(PoisonError::into_inner).push(tx);
        ReceiverStream::new(rx).map(Delivery::Event).boxed()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count() + self.open_queues().len()
    }

    fn broadcast(&self, event: &Arc<NotificationEvent>) -> usize {
        self.tx.send(Arc::clone(event)).unwrap_or(0)
    }

    // Snapshot so no lock is held across an await.
    fn open_queues(&self) -> Vec<Queue> {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        queues.retain(|queue| !queue.is_closed());
        queues.clone()
    }

    fn record(&self, event: &NotificationEvent, reached: usize) -> usize {
        let kind = event.kind();
        self.metrics.published_total.add(1, &[KeyValue::new("event", kind.as_str())]);

        if reached == 0 {
            self.metrics.unrouted_total.add(1, &[KeyValue::new("event", kind.as_str())]);
            tracing::debug!(event = %kind, "Event published with no subscribers");
        } else {
            tracing::debug!(event = %kind, receivers = reached, "Event published");
        }
        reached
    }
}
