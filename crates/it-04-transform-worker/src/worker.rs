//! # Transform Worker
//!
//! [`BatchHandler`] for the transform queue. Items are processed one after
//! another; each produces its own result and none can stop its siblings.

use crate::codec::{decode_bounded, encode, DimensionLimits};
use crate::errors::WorkerError;
use crate::filters::FilterRegistry;
use crate::{MAX_IMAGE_HEIGHT, MAX_IMAGE_SIZE_BYTES, MAX_IMAGE_WIDTH};
use async_trait::async_trait;
use bytes::Bytes;
use it_01_job_store::JobStore;
use it_02_object_storage::ObjectStore;
use shared_bus::{BatchHandler, BatchResponse, Delivery};
use shared_types::{ObjectId, StorageEvent};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// The only bucket notifications are accepted from.
    pub input_bucket: String,
    /// Where transformed objects are written.
    pub output_bucket: String,
    pub limits: DimensionLimits,
    /// Largest object size accepted from a notification.
    pub max_object_bytes: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            input_bucket: "input".to_string(),
            output_bucket: "output".to_string(),
            limits: DimensionLimits {
                max_width: MAX_IMAGE_WIDTH,
                max_height: MAX_IMAGE_HEIGHT,
            },
            max_object_bytes: MAX_IMAGE_SIZE_BYTES,
        }
    }
}

pub struct TransformWorker {
    jobs: JobStore,
    objects: Arc<dyn ObjectStore>,
    filters: Arc<FilterRegistry>,
    config: WorkerConfig,
}

impl TransformWorker {
    pub fn new(
        jobs: JobStore,
        objects: Arc<dyn ObjectStore>,
        filters: FilterRegistry,
        config: WorkerConfig,
    ) -> Self {
        Self {
            jobs,
            objects,
            filters: Arc::new(filters),
            config,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Process one notification body end to end.
    pub async fn process(&self, body: &str) -> Result<ObjectId, WorkerError> {
        let event =
            StorageEvent::from_json(body).map_err(|e| WorkerError::MalformedNotification(e.to_string()))?;
        let record = event
            .single_record()
            .ok_or(WorkerError::UnexpectedRecordCount(event.records.len()))?;

        if record.s3.bucket.name != self.config.input_bucket {
            return Err(WorkerError::WrongBucket {
                expected: self.config.input_bucket.clone(),
                actual: record.s3.bucket.name.clone(),
            });
        }
        if record.s3.object.size > self.config.max_object_bytes {
            return Err(WorkerError::ObjectTooLarge {
                size: record.s3.object.size,
                max: self.config.max_object_bytes,
            });
        }

        let object_id = ObjectId::new(record.s3.object.key.as_str());
        let input = self
            .objects
            .get_object(&self.config.input_bucket, object_id.as_str())
            .await
            .map_err(WorkerError::Fetch)?;

        let limits = self.config.limits;
        let source = input.body.clone();
        let image = run_blocking(move || decode_bounded(&source, limits)).await?;

        let job = self
            .jobs
            .fetch(&object_id)
            .await
            .map_err(WorkerError::JobLookup)?
            .filter(|job| job.object_id().is_some())
            .ok_or_else(|| WorkerError::JobMissing {
                object_id: object_id.clone(),
            })?;
        let transforms = job.transforms().map_err(WorkerError::JobLookup)?;
        let Some(content_type) = job.content_type() else {
            let err = WorkerError::UnsupportedContentType {
                object_id: object_id.clone(),
                content_type: job
                    .as_item()
                    .get(shared_types::attributes::CONTENT_TYPE)
                    .map(ToString::to_string),
            };
            error!(object_id = %object_id, error = %err, "Job record carries an unsupported content type");
            return Err(err);
        };

        let filters = self.filters.clone();
        let chain_len = transforms.len();
        let encoded = run_blocking(move || {
            let output = filters.apply_chain(image, &transforms)?;
            encode(output, content_type)
        })
        .await?;
        debug!(object_id = %object_id, transforms = chain_len, bytes = encoded.len(), "Image transformed");

        self.objects
            .put_object(
                &self.config.output_bucket,
                object_id.as_str(),
                Bytes::from(encoded),
                Some(content_type.mime_type()),
            )
            .await
            .map_err(WorkerError::Store)?;

        self.jobs
            .mark_processed(&object_id)
            .await
            .map_err(WorkerError::StatusUpdate)?;

        info!(object_id = %object_id, "Object processed");
        Ok(object_id)
    }
}

/// Run CPU-bound image work off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, WorkerError>
where
    F: FnOnce() -> Result<T, WorkerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| WorkerError::Runtime(e.to_string()))?
}

#[async_trait]
impl BatchHandler for TransformWorker {
    async fn handle_batch(&self, batch: Vec<Delivery>) -> BatchResponse {
        let mut response = BatchResponse::success();
        for delivery in batch {
            if let Err(e) = self.process(&delivery.body).await {
                warn!(
                    message_id = %delivery.message_id,
                    receive_count = delivery.receive_count,
                    error = %e,
                    "Transform failed"
                );
                response.push_failure(delivery.message_id, e);
            }
        }
        response
    }
}
