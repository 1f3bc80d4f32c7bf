//! Resolver outcomes, configuration and errors.

use it_01_job_store::JobStoreError;
use shared_types::{Capability, ObjectId};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    /// Still processing; ask again later.
    TryLater,
    /// Processing failed for good.
    Broken,
    /// Read capability for the output object.
    Ready(Capability),
}

/// A broken job store invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyViolation {
    RecordVanished,
    MissingStatus,
    UnknownStatus(String),
}

impl fmt::Display for ConsistencyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecordVanished => write!(f, "record vanished after authorization"),
            Self::MissingStatus => write!(f, "record has no status"),
            Self::UnknownStatus(raw) => write!(f, "record has unknown status {raw:?}"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("object name not supplied")]
    MissingObjectName,

    #[error("internal consistency violation for {object_id}: {violation}")]
    InternalConsistency {
        object_id: ObjectId,
        violation: ConsistencyViolation,
    },

    #[error("failed to load job record: {0}")]
    Store(#[from] JobStoreError),
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Bucket the read capability is scoped to.
    pub output_bucket: String,
    pub capability_ttl: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            output_bucket: "output".to_string(),
            capability_ttl: Duration::from_secs(it_02_object_storage::DEFAULT_CAPABILITY_TTL_SECS),
        }
    }
}
