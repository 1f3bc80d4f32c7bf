//! # Access Authorizer Service

use crate::policy::AuthorizerResponse;
use it_01_job_store::JobStore;
use shared_types::{ObjectId, SourceIdentity};
use std::fmt;
use tracing::{debug, warn};

/// Why a request was denied. Only ever logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    MissingObjectName,
    LookupFailed(String),
    RecordMissing,
    MissingSourceIdentity,
    IdentityMismatch,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingObjectName => write!(f, "object name not supplied"),
            Self::LookupFailed(e) => write!(f, "job lookup failed: {e}"),
            Self::RecordMissing => write!(f, "no job record"),
            Self::MissingSourceIdentity => write!(f, "job record has no source identity"),
            Self::IdentityMismatch => write!(f, "caller identity differs from issuer"),
        }
    }
}

#[derive(Clone)]
pub struct AccessAuthorizer {
    jobs: JobStore,
}

impl AccessAuthorizer {
    pub fn new(jobs: JobStore) -> Self {
        Self { jobs }
    }

    /// Decide whether `caller` may read `object_name`.
    pub async fn decide(
        &self,
        object_name: Option<&str>,
        caller: &SourceIdentity,
    ) -> Result<(), DenyReason> {
        let object_id = match object_name {
            Some(name) if !name.is_empty() => ObjectId::new(name),
            _ => return Err(DenyReason::MissingObjectName),
        };

        let job = self
            .jobs
            .fetch(&object_id)
            .await
            .map_err(|e| DenyReason::LookupFailed(e.to_string()))?
            .ok_or(DenyReason::RecordMissing)?;

        let recorded = job
            .source_identity()
            .ok_or(DenyReason::MissingSourceIdentity)?;

        if recorded.as_str() == caller.as_str() {
            Ok(())
        } else {
            Err(DenyReason::IdentityMismatch)
        }
    }

    /// Policy document for a request to `resource`.
    pub async fn authorize(
        &self,
        object_name: Option<&str>,
        caller: &SourceIdentity,
        resource: &str,
    ) -> AuthorizerResponse {
        match self.decide(object_name, caller).await {
            Ok(()) => {
                debug!(object_name = ?object_name, caller = %caller, "Access allowed");
                AuthorizerResponse::allow(resource)
            }
            Err(reason) => {
                warn!(object_name = ?object_name, caller = %caller, %reason, "Access denied");
                AuthorizerResponse::deny(resource)
            }
        }
    }
}
