//! # Topic
//!
//! Fans every published body out to each subscribed queue.

use crate::queue::InMemoryQueue;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Trait for publishing notification bodies.
///
/// Object storage holds one of these to announce newly created objects.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish a body.
    ///
    /// # Returns
    ///
    /// The number of queues that received it.
    async fn publish(&self, body: String) -> usize;

    /// Total bodies published.
    fn messages_published(&self) -> u64;
}

/// In-memory fan-out topic.
pub struct Topic {
    name: String,
    subscribers: RwLock<Vec<Arc<InMemoryQueue>>>,
    messages_published: AtomicU64,
}

impl Topic {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribers: RwLock::new(Vec::new()),
            messages_published: AtomicU64::new(0),
        }
    }

    /// Subscribe a queue to this topic.
    pub fn subscribe(&self, queue: Arc<InMemoryQueue>) {
        debug!(topic = %self.name, queue = %queue.name(), "Queue subscribed");
        self.subscribers.write().push(queue);
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl MessagePublisher for Topic {
    async fn publish(&self, body: String) -> usize {
        // Always increment counter (publish was attempted)
        self.messages_published.fetch_add(1, Ordering::Relaxed);

        let subscribers = self.subscribers.read().clone();
        if subscribers.is_empty() {
            warn!(topic = %self.name, "Message dropped (no subscribers)");
            return 0;
        }

        for queue in &subscribers {
            queue.send(body.clone());
        }
        debug!(topic = %self.name, receivers = subscribers.len(), "Message published");
        subscribers.len()
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}
