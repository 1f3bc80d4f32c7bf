//! # Domain Errors

use thiserror::Error;

/// Errors from an [`ObjectStore`](crate::ObjectStore).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObjectStoreError {
    #[error("bucket {bucket} does not exist")]
    NoSuchBucket { bucket: String },

    #[error("object {bucket}/{key} does not exist")]
    NoSuchKey { bucket: String, key: String },

    /// The object was stored but its notification could not be built.
    #[error("failed to emit notification: {message}")]
    Notification { message: String },

    #[error("object store backend error: {message}")]
    Backend { message: String },
}

/// Capability verification failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// The signing secret was rejected by the MAC.
    #[error("capability signing key is invalid")]
    InvalidKey,

    /// The capability grants a different operation.
    #[error("capability grants {granted}, request needs {required}")]
    OperationMismatch { granted: String, required: String },

    #[error("capability expired at {expires_at} (now {now})")]
    Expired { expires_at: u64, now: u64 },

    /// Signature is not valid hex.
    #[error("capability signature is malformed")]
    MalformedSignature,

    /// Signature does not cover this operation, bucket, key and expiry.
    #[error("capability signature is invalid")]
    InvalidSignature,
}
