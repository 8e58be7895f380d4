//! # Publishing
//!
//! The registry hands each committed event to an [`EventPublisher`]. The
//! in-memory bus fans it out to every live [`Subscription`] and remembers the
//! highest commit sequence it has carried, so a late subscriber knows where
//! the stream stood when it joined.

use crate::events::{EventFilter, RegistryEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// Sink for committed registry events.
///
/// Called once per commit, in commit order, while the registry still holds
/// its write lock. Implementations must not block.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Deliver an event. Returns how many subscribers received it.
    async fn publish(&self, event: RegistryEvent) -> usize;

    /// Events accepted so far, delivered or not.
    fn events_published(&self) -> u64;
}

/// Broadcast bus for a single registry instance.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<RegistryEvent>,
    capacity: usize,
    published: AtomicU64,
    /// Highest commit sequence seen; 0 before the first event.
    head: AtomicU64,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// `capacity` is the per-subscriber backlog; zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            capacity,
            published: AtomicU64::new(0),
            head: AtomicU64::new(0),
        }
    }

    /// Receive matching events published from now on.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(
            topics = ?filter.topics,
            batches = ?filter.batch_ids,
            head = self.head(),
            "Subscriber joined"
        );
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// [`subscribe`](Self::subscribe) as a `Stream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Commit sequence of the newest event carried by the bus.
    #[must_use]
    pub fn head(&self) -> u64 {
        self.head.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: RegistryEvent) -> usize {
        let sequence = event.sequence();
        let previous = self.head.fetch_max(sequence, Ordering::AcqRel);
        if sequence <= previous {
            warn!(sequence, head = previous, "Event behind the bus head");
        }
        self.published.fetch_add(1, Ordering::Relaxed);

        let topic = event.topic();
        // `send` only fails when nobody is subscribed.
        let delivered = self.sender.send(event).unwrap_or(0);
        trace!(?topic, sequence, delivered, "Event published");
        delivered
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
