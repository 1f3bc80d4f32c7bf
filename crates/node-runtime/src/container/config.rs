//! # Node Configuration
//!
//! Unified configuration for every component and runtime parameter.
//!
//! ## Environment
//!
//! | Variable | Field |
//! |----------|-------|
//! | `IT_INPUT_BUCKET_NAME` | `buckets.input` |
//! | `IT_OUTPUT_BUCKET_NAME` | `buckets.output` |
//! | `IT_AUTH_TABLE_NAME` | `storage.auth_table_name` |
//! | `IT_SIGNING_SECRET` | `security.signing_secret` (64 hex chars) |
//! | `IT_PUBLIC_BASE_URL` | `security.public_base_url` |
//! | `IT_HTTP_PORT` | `gateway.http.port` |
//! | `IT_DATA_DIR` | `storage.data_dir` |
//!
//! ## Security Requirements
//!
//! - `signing_secret` MUST NOT be the default zero value in production

use it_08_api_gateway::domain::BucketConfig;
use it_08_api_gateway::GatewayConfig;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_INPUT_BUCKET: &str = "IT_INPUT_BUCKET_NAME";
pub const ENV_OUTPUT_BUCKET: &str = "IT_OUTPUT_BUCKET_NAME";
pub const ENV_AUTH_TABLE: &str = "IT_AUTH_TABLE_NAME";
pub const ENV_SIGNING_SECRET: &str = "IT_SIGNING_SECRET";
pub const ENV_PUBLIC_BASE_URL: &str = "IT_PUBLIC_BASE_URL";
pub const ENV_HTTP_PORT: &str = "IT_HTTP_PORT";
pub const ENV_DATA_DIR: &str = "IT_DATA_DIR";

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub buckets: BucketConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub queue: QueueSettings,
    pub worker: WorkerSettings,
    /// Gateway settings. Its bucket names are overwritten from `buckets`.
    pub gateway: GatewayConfig,
}

impl NodeConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(bucket) = lookup(ENV_INPUT_BUCKET) {
            config.buckets.input = bucket;
        }
        if let Some(bucket) = lookup(ENV_OUTPUT_BUCKET) {
            config.buckets.output = bucket;
        }
        if let Some(table) = lookup(ENV_AUTH_TABLE) {
            config.storage.auth_table_name = table;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(ENV_PUBLIC_BASE_URL) {
            config.security.public_base_url = url;
        }
        if let Some(port) = lookup(ENV_HTTP_PORT) {
            config.gateway.http.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if let Some(secret_hex) = lookup(ENV_SIGNING_SECRET) {
            config.security.signing_secret = parse_secret(&secret_hex)?;
        }

        Ok(config)
    }

    /// Validate configuration for production readiness.
    ///
    /// # Returns
    ///
    /// Returns `Err` if:
    /// - the signing secret is the default zero value
    /// - a bucket name is empty, or both buckets are the same
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.security.signing_secret == [0u8; 32] {
            return Err(ConfigError::InsecureSigningSecret);
        }
        if self.buckets.input.is_empty() || self.buckets.output.is_empty() {
            return Err(ConfigError::EmptyBucketName);
        }
        if self.buckets.input == self.buckets.output {
            return Err(ConfigError::SharedBucket(self.buckets.input.clone()));
        }
        Ok(())
    }

    /// Gateway configuration with the node's bucket names applied.
    pub fn gateway_config(&self) -> GatewayConfig {
        let mut gateway = self.gateway.clone();
        gateway.buckets = self.buckets.clone();
        gateway
    }
}

fn parse_secret(secret_hex: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = hex::decode(secret_hex.trim()).map_err(|_| ConfigError::InvalidSigningSecret)?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| ConfigError::InvalidSigningSecret)
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "SECURITY VIOLATION: signing secret is default zero value. \
         Set {ENV_SIGNING_SECRET} environment variable."
    )]
    InsecureSigningSecret,

    #[error("{ENV_SIGNING_SECRET} must be 32 bytes (64 hex chars)")]
    InvalidSigningSecret,

    #[error("invalid port {0:?}")]
    InvalidPort(String),

    #[error("bucket names cannot be empty")]
    EmptyBucketName,

    #[error("input and output bucket are both {0:?}")]
    SharedBucket(String),
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root for persistent state (`rocksdb` feature).
    pub data_dir: PathBuf,
    /// Name of the job record table; its directory under `data_dir`.
    pub auth_table_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            auth_table_name: "auth".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn table_path(&self) -> PathBuf {
        self.data_dir.join(&self.auth_table_name)
    }
}

/// Capability signing.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// HMAC secret for capabilities (32 bytes).
    /// MUST NOT be default in production.
    pub signing_secret: [u8; 32],
    /// Prefix of every capability URL.
    pub public_base_url: String,
    pub capability_ttl: Duration,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            signing_secret: [0u8; 32], // MUST be overridden in production
            public_base_url: "http://localhost:8080".to_string(),
            capability_ttl: Duration::from_secs(it_02_object_storage::DEFAULT_CAPABILITY_TTL_SECS),
        }
    }
}

/// Transform queue and dead-letter queue settings.
#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub batch_size: usize,
    pub visibility_timeout: Duration,
    pub max_receive_count: u32,
    /// Long-poll wait per receive.
    pub poll_wait: Duration,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            batch_size: shared_bus::DEFAULT_BATCH_SIZE,
            visibility_timeout: Duration::from_secs(shared_bus::DEFAULT_VISIBILITY_TIMEOUT_SECS),
            max_receive_count: shared_bus::DEFAULT_MAX_RECEIVE_COUNT,
            poll_wait: Duration::from_secs(20),
        }
    }
}

/// Batch consumer budgets.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Wall-clock budget of one transform batch.
    pub transform_timeout: Duration,
    /// Wall-clock budget of one dead-letter batch.
    pub dead_letter_timeout: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            transform_timeout: Duration::from_secs(300),
            dead_letter_timeout: Duration::from_secs(10),
        }
    }
}
