//! # In-Memory Queue
//!
//! At-least-once, batched delivery with a visibility timeout and dead-letter
//! redrive.
//!
//! ## Message Lifecycle
//!
//! ```text
//! send() → [ready] ──receive──→ [in flight] ──ack──→ (deleted)
//!             ↑                      │
//!             └──release / timeout───┘
//!
//! receive with receive_count >= max_receive_count → dead-letter queue
//! ```

use crate::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_RECEIVE_COUNT, DEFAULT_VISIBILITY_TIMEOUT_SECS};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors from queue operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The message is not in flight (already acknowledged, or its
    /// visibility timeout lapsed and it was redelivered).
    #[error("no in-flight delivery for message {0}")]
    UnknownDelivery(Uuid),
}

/// Queue behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Maximum deliveries per receive.
    pub batch_size: usize,
    /// How long a received message stays hidden.
    pub visibility_timeout: Duration,
    /// Receives allowed before redrive. Only enforced when a dead-letter
    /// queue is attached.
    pub max_receive_count: u32,
    /// Delay before a released message becomes visible again.
    pub retry_delay: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            visibility_timeout: Duration::from_secs(DEFAULT_VISIBILITY_TIMEOUT_SECS),
            max_receive_count: DEFAULT_MAX_RECEIVE_COUNT,
            retry_delay: Duration::ZERO,
        }
    }
}

/// One received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub message_id: Uuid,
    pub body: String,
    /// Number of times this message has been received, including this one.
    pub receive_count: u32,
}

/// Point-in-time queue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub ready: usize,
    pub in_flight: usize,
    pub dead_lettered: u64,
}

#[derive(Debug)]
struct StoredMessage {
    id: Uuid,
    body: String,
    receive_count: u32,
}

#[derive(Debug)]
struct InFlight {
    message: StoredMessage,
    visible_at: Instant,
}

#[derive(Debug, Default)]
struct QueueState {
    ready: VecDeque<StoredMessage>,
    in_flight: HashMap<Uuid, InFlight>,
    dead_lettered: u64,
}

impl QueueState {
    /// Move every in-flight message whose visibility lapsed back to `ready`.
    fn restore_expired(&mut self, now: Instant) {
        let mut expired: Vec<(Instant, Uuid)> = self
            .in_flight
            .iter()
            .filter(|(_, entry)| entry.visible_at <= now)
            .map(|(id, entry)| (entry.visible_at, *id))
            .collect();
        expired.sort();

        for (_, id) in expired {
            if let Some(entry) = self.in_flight.remove(&id) {
                self.ready.push_back(entry.message);
            }
        }
    }

    fn next_visible_at(&self) -> Option<Instant> {
        self.in_flight.values().map(|entry| entry.visible_at).min()
    }
}

/// In-memory queue with optional dead-letter redrive.
pub struct InMemoryQueue {
    name: String,
    config: QueueConfig,
    state: Mutex<QueueState>,
    notify: Notify,
    dead_letter: Option<Arc<InMemoryQueue>>,
}

impl InMemoryQueue {
    #[must_use]
    pub fn new(name: impl Into<String>, config: QueueConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            dead_letter: None,
        }
    }

    /// Attach a dead-letter queue; enables the receive-count bound.
    #[must_use]
    pub fn with_dead_letter(mut self, dead_letter: Arc<InMemoryQueue>) -> Self {
        self.dead_letter = Some(dead_letter);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Enqueue a new message. Returns its id.
    pub fn send(&self, body: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.enqueue(StoredMessage {
            id,
            body: body.into(),
            receive_count: 0,
        });
        debug!(queue = %self.name, message_id = %id, "Message enqueued");
        id
    }

    fn enqueue(&self, message: StoredMessage) {
        self.state.lock().ready.push_back(message);
        self.notify.notify_one();
    }

    /// Receive up to `batch_size` visible messages without waiting.
    ///
    /// Messages that already reached `max_receive_count` are moved to the
    /// dead-letter queue instead of being returned.
    pub fn receive_batch(&self) -> Vec<Delivery> {
        let now = Instant::now();
        let mut redrive = Vec::new();

        let deliveries = {
            let mut state = self.state.lock();
            state.restore_expired(now);

            let mut out = Vec::with_capacity(self.config.batch_size);
            while out.len() < self.config.batch_size {
                let Some(mut message) = state.ready.pop_front() else {
                    break;
                };

                if self.dead_letter.is_some()
                    && message.receive_count >= self.config.max_receive_count
                {
                    redrive.push(message);
                    continue;
                }

                message.receive_count += 1;
                out.push(Delivery {
                    message_id: message.id,
                    body: message.body.clone(),
                    receive_count: message.receive_count,
                });
                state.in_flight.insert(
                    message.id,
                    InFlight {
                        message,
                        visible_at: now + self.config.visibility_timeout,
                    },
                );
            }

            state.dead_lettered += redrive.len() as u64;
            out
        };

        if let Some(dead_letter) = &self.dead_letter {
            for message in redrive {
                warn!(
                    queue = %self.name,
                    dead_letter_queue = %dead_letter.name,
                    message_id = %message.id,
                    receive_count = message.receive_count,
                    "Receive count exhausted, moving message to dead-letter queue"
                );
                dead_letter.enqueue(StoredMessage {
                    receive_count: 0,
                    ..message
                });
            }
        }

        deliveries
    }

    /// Long-poll: wait up to `wait` for at least one visible message.
    pub async fn receive_batch_wait(&self, wait: Duration) -> Vec<Delivery> {
        let deadline = Instant::now() + wait;
        loop {
            let notified = self.notify.notified();
            let batch = self.receive_batch();
            if !batch.is_empty() || Instant::now() >= deadline {
                return batch;
            }

            let wake = self
                .state
                .lock()
                .next_visible_at()
                .map_or(deadline, |at| at.min(deadline));

            tokio::select! {
                () = notified => {}
                () = tokio::time::sleep_until(wake) => {}
            }
        }
    }

    /// Delete an in-flight message.
    pub fn ack(&self, message_id: Uuid) -> Result<(), QueueError> {
        self.state
            .lock()
            .in_flight
            .remove(&message_id)
            .map(|_| ())
            .ok_or(QueueError::UnknownDelivery(message_id))
    }

    /// Make an in-flight message visible again after `retry_delay`.
    pub fn release(&self, message_id: Uuid) -> Result<(), QueueError> {
        {
            let mut state = self.state.lock();
            let entry = state
                .in_flight
                .get_mut(&message_id)
                .ok_or(QueueError::UnknownDelivery(message_id))?;
            entry.visible_at = Instant::now() + self.config.retry_delay;
        }
        self.notify.notify_one();
        Ok(())
    }

    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            ready: state.ready.len(),
            in_flight: state.in_flight.len(),
            dead_lettered: state.dead_lettered,
        }
    }

    /// True when nothing is ready or in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let state = self.state.lock();
        state.ready.is_empty() && state.in_flight.is_empty()
    }
}
