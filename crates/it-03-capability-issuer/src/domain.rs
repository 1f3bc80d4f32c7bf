//! Issuer request, response, configuration and errors.

use it_01_job_store::JobStoreError;
use serde::Deserialize;
use shared_types::{Capability, ObjectId, Transform};
use std::time::Duration;
use thiserror::Error;

/// Body of `POST /generate-url`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerateUrlRequest {
    /// Used only to derive the suffix.
    #[serde(rename = "ObjectName")]
    pub object_name: String,
    /// Stored as given; validated by the transform worker.
    #[serde(rename = "Transforms", default)]
    pub transforms: Vec<Transform>,
}

/// A freshly issued object identifier and its write capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCapability {
    pub object_id: ObjectId,
    pub capability: Capability,
}

#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// Bucket the write capability is scoped to.
    pub input_bucket: String,
    pub capability_ttl: Duration,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            input_bucket: "input".to_string(),
            capability_ttl: Duration::from_secs(it_02_object_storage::DEFAULT_CAPABILITY_TTL_SECS),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IssueError {
    /// The requested name does not end in an allow-listed suffix.
    #[error("unsupported media type for object name {object_name:?}")]
    UnsupportedMediaType { object_name: String },

    #[error("failed to create job record: {0}")]
    Store(#[from] JobStoreError),
}
