//! # Queue Poller
//!
//! Drives a [`BatchHandler`] from a queue: long-poll, run the handler under
//! the invocation budget, then acknowledge successes and release failures.

use crate::queue::{Delivery, InMemoryQueue};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A batch consumer.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    /// Process a batch and report the items that failed.
    ///
    /// Items absent from `item_failures` are considered processed.
    async fn handle_batch(&self, batch: Vec<Delivery>) -> BatchResponse;
}

/// One failed item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItemFailure {
    pub message_id: Uuid,
    pub error: String,
}

/// Partial batch failure report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResponse {
    pub item_failures: Vec<BatchItemFailure>,
}

impl BatchResponse {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    pub fn push_failure(&mut self, message_id: Uuid, error: impl ToString) {
        self.item_failures.push(BatchItemFailure {
            message_id,
            error: error.to_string(),
        });
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.item_failures.is_empty()
    }
}

/// Poller timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Long-poll wait per receive.
    pub wait_time: Duration,
    /// Wall-clock budget of one handler invocation.
    pub invocation_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            wait_time: Duration::from_secs(20),
            invocation_timeout: Duration::from_secs(300),
        }
    }
}

/// What happened to one dispatched batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub acknowledged: usize,
    pub released: usize,
    /// The handler exceeded its budget; every item stays in flight until
    /// its visibility timeout lapses.
    pub timed_out: bool,
}

/// Long-polls one queue and dispatches batches to a handler.
pub struct QueuePoller {
    queue: Arc<InMemoryQueue>,
    handler: Arc<dyn BatchHandler>,
    config: PollerConfig,
}

impl QueuePoller {
    #[must_use]
    pub fn new(queue: Arc<InMemoryQueue>, handler: Arc<dyn BatchHandler>, config: PollerConfig) -> Self {
        Self {
            queue,
            handler,
            config,
        }
    }

    /// Receive one batch (waiting up to `wait_time`) and dispatch it.
    ///
    /// Returns `None` if nothing arrived.
    pub async fn poll_once(&self) -> Option<BatchOutcome> {
        let batch = self.queue.receive_batch_wait(self.config.wait_time).await;
        if batch.is_empty() {
            return None;
        }
        Some(self.dispatch(batch).await)
    }

    /// Run the handler on `batch` and settle every item.
    pub async fn dispatch(&self, batch: Vec<Delivery>) -> BatchOutcome {
        let ids: Vec<Uuid> = batch.iter().map(|d| d.message_id).collect();
        let queue = self.queue.name();
        debug!(queue = %queue, size = ids.len(), "Dispatching batch");

        let response = match tokio::time::timeout(
            self.config.invocation_timeout,
            self.handler.handle_batch(batch),
        )
        .await
        {
            Ok(response) => response,
            Err(_) => {
                warn!(
                    queue = %queue,
                    size = ids.len(),
                    budget_ms = self.config.invocation_timeout.as_millis() as u64,
                    "Batch invocation timed out; items left for redelivery"
                );
                return BatchOutcome {
                    timed_out: true,
                    ..BatchOutcome::default()
                };
            }
        };

        let failed: HashSet<Uuid> = response
            .item_failures
            .iter()
            .map(|failure| {
                warn!(
                    queue = %queue,
                    message_id = %failure.message_id,
                    error = %failure.error,
                    "Batch item failed"
                );
                failure.message_id
            })
            .collect();

        let mut outcome = BatchOutcome::default();
        for id in ids {
            let settled = if failed.contains(&id) {
                self.queue.release(id).map(|()| outcome.released += 1)
            } else {
                self.queue.ack(id).map(|()| outcome.acknowledged += 1)
            };
            if let Err(e) = settled {
                debug!(queue = %queue, message_id = %id, error = %e, "Delivery already settled");
            }
        }
        outcome
    }

    /// Poll until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(queue = %self.queue.name(), "Queue poller started");
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                outcome = self.poll_once() => {
                    if let Some(outcome) = outcome {
                        debug!(
                            queue = %self.queue.name(),
                            acknowledged = outcome.acknowledged,
                            released = outcome.released,
                            timed_out = outcome.timed_out,
                            "Batch settled"
                        );
                    }
                }
            }
        }
        info!(queue = %self.queue.name(), "Queue poller stopped");
    }
}
