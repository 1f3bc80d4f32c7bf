//! # Domain Errors
//!
//! - `StoreError` - raw metadata-store failures
//! - `JobStoreError` - failures of the typed job repository

use shared_types::ObjectId;
use thiserror::Error;

/// Errors from a [`MetadataStore`](crate::MetadataStore) adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The write's precondition did not hold; nothing was written.
    #[error("conditional check failed for {key}")]
    ConditionFailed { key: String },

    /// Backend I/O failure.
    #[error("metadata store backend error: {message}")]
    Backend { message: String },

    /// A stored value could not be encoded or decoded.
    #[error("metadata store encoding error: {message}")]
    Encoding { message: String },
}

/// Errors from the typed [`JobStore`](crate::JobStore).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobStoreError {
    /// A record already exists for this identifier.
    #[error("job record {object_id} already exists")]
    AlreadyExists { object_id: ObjectId },

    /// No record exists for this identifier.
    #[error("job record {object_id} not found")]
    NotFound { object_id: ObjectId },

    /// The record's current status forbids the requested transition.
    #[error("job record {object_id} cannot move from {from} to {to}")]
    InvalidTransition {
        object_id: ObjectId,
        from: String,
        to: String,
    },

    /// The stored record does not match the job record shape.
    #[error("job record {object_id} is malformed: {reason}")]
    Malformed { object_id: ObjectId, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
