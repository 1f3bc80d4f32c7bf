pub mod config;
pub mod error;

pub use config::{
    BucketConfig, ConfigError, CorsConfig, GatewayConfig, HttpConfig, LimitsConfig,
    SecurityConfig, TimeoutConfig,
};
pub use error::{codes, ApiError, ErrorBody, GatewayError};
