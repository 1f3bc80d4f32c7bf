//! # Access Resolver Service

use crate::domain::{AccessOutcome, ConsistencyViolation, ResolveError, ResolverConfig};
use it_01_job_store::JobStore;
use it_02_object_storage::CapabilitySigner;
use shared_types::{CapabilityOperation, JobStatus, ObjectId};
use tracing::{debug, error, info};

pub struct AccessResolver {
    jobs: JobStore,
    signer: CapabilitySigner,
    config: ResolverConfig,
}

impl AccessResolver {
    pub fn new(jobs: JobStore, signer: CapabilitySigner, config: ResolverConfig) -> Self {
        Self {
            jobs,
            signer,
            config,
        }
    }

    pub async fn resolve(&self, object_name: Option<&str>) -> Result<AccessOutcome, ResolveError> {
        let object_id = match object_name {
            Some(name) if !name.is_empty() => ObjectId::new(name),
            _ => return Err(ResolveError::MissingObjectName),
        };

        let Some(job) = self.jobs.fetch(&object_id).await? else {
            return Err(violation(object_id, ConsistencyViolation::RecordVanished));
        };

        let status = match job.raw_status() {
            None => return Err(violation(object_id, ConsistencyViolation::MissingStatus)),
            Some(raw) => match JobStatus::parse(raw) {
                Some(status) => status,
                None => {
                    let raw = raw.to_string();
                    return Err(violation(object_id, ConsistencyViolation::UnknownStatus(raw)));
                }
            },
        };

        match status {
            JobStatus::Processing => {
                debug!(object_id = %object_id, "Object still processing");
                Ok(AccessOutcome::TryLater)
            }
            JobStatus::Broken => {
                info!(object_id = %object_id, "Object is broken");
                Ok(AccessOutcome::Broken)
            }
            JobStatus::Processed => {
                let capability = self.signer.presign(
                    CapabilityOperation::Read,
                    &self.config.output_bucket,
                    object_id.as_str(),
                    self.config.capability_ttl,
                );
                info!(object_id = %object_id, expires_at = capability.expires_at, "Read capability issued");
                Ok(AccessOutcome::Ready(capability))
            }
        }
    }
}

fn violation(object_id: ObjectId, violation: ConsistencyViolation) -> ResolveError {
    error!(object_id = %object_id, %violation, "Job store invariant violated");
    ResolveError::InternalConsistency {
        object_id,
        violation,
    }
}
