//! # Capability Issuer Service

use crate::domain::{GenerateUrlRequest, IssueError, IssuedCapability, IssuerConfig};
use it_01_job_store::JobStore;
use it_02_object_storage::CapabilitySigner;
use shared_types::{CapabilityOperation, ContentType, JobRecord, ObjectId, SourceIdentity};
use tracing::{info, warn};

pub struct CapabilityIssuer {
    jobs: JobStore,
    signer: CapabilitySigner,
    config: IssuerConfig,
}

impl CapabilityIssuer {
    pub fn new(jobs: JobStore, signer: CapabilitySigner, config: IssuerConfig) -> Self {
        Self {
            jobs,
            signer,
            config,
        }
    }

    /// Validate the request, create the job record and issue a write
    /// capability for the new object.
    pub async fn issue(
        &self,
        request: GenerateUrlRequest,
        source: SourceIdentity,
    ) -> Result<IssuedCapability, IssueError> {
        let Some(content_type) = ContentType::from_object_name(&request.object_name) else {
            warn!(object_name = %request.object_name, "Rejected upload request: unsupported media type");
            return Err(IssueError::UnsupportedMediaType {
                object_name: request.object_name,
            });
        };

        let object_id = ObjectId::generate(content_type);
        let record = JobRecord::issued(object_id.clone(), source, content_type, request.transforms);
        self.jobs.create(&record).await?;

        let capability = self.signer.presign(
            CapabilityOperation::Write,
            &self.config.input_bucket,
            object_id.as_str(),
            self.config.capability_ttl,
        );

        info!(
            object_id = %object_id,
            source = %record.source_identity,
            transforms = record.transforms.len(),
            "Write capability issued"
        );
        Ok(IssuedCapability {
            object_id,
            capability,
        })
    }
}
