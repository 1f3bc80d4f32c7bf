//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use shared_types::MAX_IMAGE_SIZE_BYTES;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub http: HttpConfig,
    pub buckets: BucketConfig,
    pub limits: LimitsConfig,
    pub timeouts: TimeoutConfig,
    pub cors: CorsConfig,
    pub security: SecurityConfig,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buckets.input.is_empty() || self.buckets.output.is_empty() {
            return Err(ConfigError::Invalid("bucket names cannot be empty".into()));
        }
        if self.buckets.input == self.buckets.output {
            return Err(ConfigError::Invalid(
                "input and output buckets must differ".into(),
            ));
        }
        if self.limits.max_object_bytes == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_object_bytes cannot be 0".into(),
            ));
        }
        if self.limits.max_request_bytes == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_request_bytes cannot be 0".into(),
            ));
        }
        if self.timeouts.request.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request timeout cannot be 0".into(),
            ));
        }
        Ok(())
    }

    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    /// Uploads land here.
    pub input: String,
    /// Transformed objects are read from here.
    pub output: String,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            input: "input".to_string(),
            output: "output".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted object upload.
    pub max_object_bytes: usize,
    /// Largest accepted `/generate-url` body.
    pub max_request_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_object_bytes: usize::try_from(MAX_IMAGE_SIZE_BYTES).unwrap_or(usize::MAX),
            max_request_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Budget for every request.
    pub request: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub expose_headers: Vec<String>,
    /// Preflight cache lifetime in seconds.
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["GET".to_string(), "POST".to_string(), "PUT".to_string()],
            allowed_headers: vec!["Content-Type".to_string()],
            expose_headers: vec!["object-name".to_string()],
            max_age: 3600,
        }
    }
}

/// Client identity resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Peers allowed to set `X-Forwarded-For`.
    pub trusted_proxies: Vec<IpAddr>,
    pub trust_localhost: bool,
    pub trust_private_ips: bool,
    /// Number of trusted proxies in front of the gateway.
    pub proxy_count: usize,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
