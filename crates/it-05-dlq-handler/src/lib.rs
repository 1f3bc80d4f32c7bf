//! # DLQ Handler (it-05)
//!
//! Consumes notifications that exhausted their redelivery budget and marks
//! every referenced job `broken`.
//!
//! - A missing record is an error for that message only.
//! - All errors of a batch are collected and reported together once the
//!   batch is done.
//! - Nothing is ever re-enqueued: the dead-letter queue is terminal.

use async_trait::async_trait;
use it_01_job_store::{JobStore, JobStoreError};
use shared_bus::{BatchHandler, BatchResponse, Delivery};
use shared_types::{ObjectId, StorageEvent};
use std::fmt;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Failure for one dead-lettered message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DlqError {
    #[error("message {message_id}: body is not a storage event: {reason}")]
    Malformed { message_id: Uuid, reason: String },

    #[error("message {message_id}: failed to mark {object_id} broken: {source}")]
    MarkBroken {
        message_id: Uuid,
        object_id: ObjectId,
        #[source]
        source: JobStoreError,
    },
}

/// Every failure of one batch, reported jointly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub struct DlqBatchError {
    pub errors: Vec<DlqError>,
}

impl fmt::Display for DlqBatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

pub struct DlqHandler {
    jobs: JobStore,
}

impl DlqHandler {
    pub fn new(jobs: JobStore) -> Self {
        Self { jobs }
    }

    /// Mark every job referenced by `batch` broken.
    ///
    /// Returns the number of records marked.
    pub async fn handle(&self, batch: &[Delivery]) -> Result<usize, DlqBatchError> {
        let mut errors = Vec::new();
        let mut marked = 0;

        for delivery in batch {
            let event = match StorageEvent::from_json(&delivery.body) {
                Ok(event) => event,
                Err(e) => {
                    errors.push(DlqError::Malformed {
                        message_id: delivery.message_id,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for record in &event.records {
                let object_id = ObjectId::new(record.s3.object.key.as_str());
                match self.jobs.mark_broken(&object_id).await {
                    Ok(()) => {
                        warn!(object_id = %object_id, message_id = %delivery.message_id, "Job marked broken");
                        marked += 1;
                    }
                    Err(source) => errors.push(DlqError::MarkBroken {
                        message_id: delivery.message_id,
                        object_id,
                        source,
                    }),
                }
            }
        }

        if errors.is_empty() {
            Ok(marked)
        } else {
            Err(DlqBatchError { errors })
        }
    }
}

#[async_trait]
impl BatchHandler for DlqHandler {
    async fn handle_batch(&self, batch: Vec<Delivery>) -> BatchResponse {
        match self.handle(&batch).await {
            Ok(marked) => info!(size = batch.len(), marked, "Dead-letter batch handled"),
            Err(e) => error!(
                size = batch.len(),
                failures = e.errors.len(),
                error = %e,
                "Dead-letter batch finished with errors"
            ),
        }
        // Dead letters are never redelivered.
        BatchResponse::success()
    }
}
