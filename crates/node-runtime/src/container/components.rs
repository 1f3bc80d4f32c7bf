//! # Component Container
//!
//! Holds every pipeline component and the queues between them.
//!
//! ## Wiring
//!
//! ```text
//! Object Store (input bucket, "image-" prefix)
//!        │ creation notification
//!        ↓
//!  storage-events topic ──→ transform queue ──→ Transform Worker
//!                                  │ receive count exhausted
//!                                  ↓
//!                           dead-letter queue ──→ DLQ Handler
//! ```
//!
//! Every component shares one `JobStore` and one `CapabilitySigner`.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use it_01_job_store::{JobStore, MetadataStore, StoreError};
use it_02_object_storage::{
    CapabilityError, CapabilitySigner, InMemoryObjectStore, NotificationRule, ObjectStore,
    SystemTimeSource, TimeSource,
};
use it_03_capability_issuer::{CapabilityIssuer, IssuerConfig};
use it_04_transform_worker::{FilterRegistry, TransformWorker, WorkerConfig};
use it_05_dlq_handler::DlqHandler;
use it_06_access_authorizer::AccessAuthorizer;
use it_07_access_resolver::{AccessResolver, ResolverConfig};
use it_08_api_gateway::GatewayComponents;
use shared_bus::{InMemoryQueue, QueueConfig, Topic};
use shared_types::OBJECT_KEY_PREFIX;

use crate::container::config::NodeConfig;

pub const STORAGE_EVENTS_TOPIC: &str = "storage-events";
pub const TRANSFORM_QUEUE: &str = "transform";
pub const DEAD_LETTER_QUEUE: &str = "transform-dlq";

/// Container build failures.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("failed to open job table: {0}")]
    Store(#[from] StoreError),

    #[error("invalid signing secret: {0}")]
    Signer(#[from] CapabilityError),
}

/// Central container holding all component instances.
pub struct Container {
    pub config: NodeConfig,
    pub jobs: JobStore,
    pub objects: Arc<InMemoryObjectStore>,
    pub topic: Arc<Topic>,
    pub transform_queue: Arc<InMemoryQueue>,
    pub dead_letter_queue: Arc<InMemoryQueue>,
    pub signer: CapabilitySigner,
    pub issuer: Arc<CapabilityIssuer>,
    pub worker: Arc<TransformWorker>,
    pub dlq_handler: Arc<DlqHandler>,
    pub authorizer: Arc<AccessAuthorizer>,
    pub resolver: Arc<AccessResolver>,
}

impl Container {
    /// Build every component with the system clock.
    pub fn build(config: NodeConfig) -> Result<Self, ContainerError> {
        Self::build_with_time(config, Arc::new(SystemTimeSource))
    }

    /// Build every component with the given clock.
    pub fn build_with_time(
        config: NodeConfig,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self, ContainerError> {
        let metadata = open_metadata_store(&config)?;
        Ok(Self::assemble(config, metadata, time)?)
    }

    /// Wire components around an already opened metadata store.
    pub fn assemble(
        config: NodeConfig,
        metadata: Arc<dyn MetadataStore>,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self, CapabilityError> {
        info!(
            input_bucket = %config.buckets.input,
            output_bucket = %config.buckets.output,
            table = %config.storage.auth_table_name,
            "Initializing components"
        );

        let jobs = JobStore::new(metadata);

        // Queues: transform queue redrives into the dead-letter queue.
        let dead_letter_queue = Arc::new(InMemoryQueue::new(
            DEAD_LETTER_QUEUE,
            QueueConfig {
                batch_size: config.queue.batch_size,
                visibility_timeout: config.queue.visibility_timeout,
                ..QueueConfig::default()
            },
        ));
        let transform_queue = Arc::new(
            InMemoryQueue::new(
                TRANSFORM_QUEUE,
                QueueConfig {
                    batch_size: config.queue.batch_size,
                    visibility_timeout: config.queue.visibility_timeout,
                    max_receive_count: config.queue.max_receive_count,
                    ..QueueConfig::default()
                },
            )
            .with_dead_letter(Arc::clone(&dead_letter_queue)),
        );
        let topic = Arc::new(Topic::new(STORAGE_EVENTS_TOPIC));
        topic.subscribe(Arc::clone(&transform_queue));

        let objects = Arc::new(InMemoryObjectStore::new([
            config.buckets.input.clone(),
            config.buckets.output.clone(),
        ]));
        objects.add_notification(NotificationRule {
            bucket: config.buckets.input.clone(),
            prefix: OBJECT_KEY_PREFIX.to_string(),
            publisher: topic.clone(),
        });

        let signer = CapabilitySigner::new(
            &config.security.signing_secret,
            config.security.public_base_url.clone(),
            time,
        )?;

        let issuer = Arc::new(CapabilityIssuer::new(
            jobs.clone(),
            signer.clone(),
            IssuerConfig {
                input_bucket: config.buckets.input.clone(),
                capability_ttl: config.security.capability_ttl,
            },
        ));

        let worker_config = WorkerConfig {
            input_bucket: config.buckets.input.clone(),
            output_bucket: config.buckets.output.clone(),
            ..WorkerConfig::default()
        };
        let worker = Arc::new(TransformWorker::new(
            jobs.clone(),
            objects.clone(),
            FilterRegistry::standard(),
            worker_config,
        ));

        let dlq_handler = Arc::new(DlqHandler::new(jobs.clone()));
        let authorizer = Arc::new(AccessAuthorizer::new(jobs.clone()));
        let resolver = Arc::new(AccessResolver::new(
            jobs.clone(),
            signer.clone(),
            ResolverConfig {
                output_bucket: config.buckets.output.clone(),
                capability_ttl: config.security.capability_ttl,
            },
        ));

        info!(
            subscribers = topic.subscriber_count(),
            "Components initialized"
        );

        Ok(Self {
            config,
            jobs,
            objects,
            topic,
            transform_queue,
            dead_letter_queue,
            signer,
            issuer,
            worker,
            dlq_handler,
            authorizer,
            resolver,
        })
    }

    /// Components handed to the API gateway.
    pub fn gateway_components(&self) -> GatewayComponents {
        let objects: Arc<dyn ObjectStore> = self.objects.clone();
        GatewayComponents {
            issuer: Arc::clone(&self.issuer),
            authorizer: Arc::clone(&self.authorizer),
            resolver: Arc::clone(&self.resolver),
            signer: self.signer.clone(),
            objects,
        }
    }
}

#[cfg(not(feature = "rocksdb"))]
fn open_metadata_store(_config: &NodeConfig) -> Result<Arc<dyn MetadataStore>, StoreError> {
    Ok(Arc::new(it_01_job_store::InMemoryMetadataStore::new()))
}

#[cfg(feature = "rocksdb")]
fn open_metadata_store(config: &NodeConfig) -> Result<Arc<dyn MetadataStore>, StoreError> {
    use it_01_job_store::{RocksDbMetadataConfig, RocksDbMetadataStore};

    let path = config.storage.table_path();
    info!(path = %path.display(), "Opening job table");
    let store = RocksDbMetadataStore::open(RocksDbMetadataConfig {
        path: path.to_string_lossy().into_owned(),
        ..RocksDbMetadataConfig::default()
    })?;
    Ok(Arc::new(store))
}
