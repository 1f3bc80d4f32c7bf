//! # Worker Errors

use it_01_job_store::JobStoreError;
use it_02_object_storage::ObjectStoreError;
use shared_types::ObjectId;
use thiserror::Error;

/// A filter rejected its parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("{filter} expects exactly {expected} parameter(s), got {got}")]
    Arity {
        filter: String,
        expected: usize,
        got: usize,
    },

    #[error("{filter} parameter {value:?} is invalid: {reason}")]
    InvalidParameter {
        filter: String,
        value: String,
        reason: String,
    },
}

/// A step of the transform chain failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("transform #{index} ({name}) failed: {source}")]
pub struct ChainError {
    pub index: usize,
    pub name: String,
    #[source]
    pub source: FilterError,
}

/// Per-item failure of the transform worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("notification body is not a storage event: {0}")]
    MalformedNotification(String),

    #[error("notification references {0} objects, expected exactly one")]
    UnexpectedRecordCount(usize),

    #[error("notification is for bucket {actual}, expected {expected}")]
    WrongBucket { expected: String, actual: String },

    #[error("object size {size} exceeds maximum {max}")]
    ObjectTooLarge { size: u64, max: u64 },

    #[error("failed to fetch input object: {0}")]
    Fetch(#[source] ObjectStoreError),

    #[error("failed to read image header: {0}")]
    Probe(String),

    #[error("image dimensions {width}x{height} exceed maximum {max_width}x{max_height}")]
    DimensionsExceeded {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to load job record: {0}")]
    JobLookup(#[source] JobStoreError),

    #[error("job record for {object_id} not found")]
    JobMissing { object_id: ObjectId },

    #[error(transparent)]
    Transform(#[from] ChainError),

    /// Unreachable when the issuer validated the suffix.
    #[error("job record for {object_id} has unsupported content type {content_type:?}")]
    UnsupportedContentType {
        object_id: ObjectId,
        content_type: Option<String>,
    },

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("failed to write output object: {0}")]
    Store(#[source] ObjectStoreError),

    #[error("failed to mark job processed: {0}")]
    StatusUpdate(#[source] JobStoreError),

    #[error("image task aborted: {0}")]
    Runtime(String),
}
