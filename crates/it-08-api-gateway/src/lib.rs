//! # API Gateway (it-08)
//!
//! The only HTTP surface of the pipeline.
//!
//! ```text
//! POST /generate-url ─────────────────────────────→ Capability Issuer
//! GET  /access-object ──→ [Authorizer gate] ──────→ Access Resolver
//! PUT  /objects/:bucket/:key ──→ [write capability] → Object Store
//! GET  /objects/:bucket/:key ──→ [read capability] ─→ Object Store
//! ```
//!
//! Client identity is the TCP peer address unless the peer is a trusted
//! proxy. Error bodies carry a stable code and a generic message only.
//!
//! ## Crate Structure
//!
//! - `domain/` - Configuration and HTTP error rendering
//! - `middleware/` - Identity, authorizer gate, timeout, tracing, CORS
//! - `handlers.rs` - Route handlers
//! - `service.rs` - Router assembly and server lifecycle

pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod service;

pub use domain::{codes, ApiError, ConfigError, ErrorBody, GatewayConfig, GatewayError};
pub use handlers::{AppState, OBJECT_NAME_HEADER};
pub use middleware::ClientIdentity;
pub use service::{ApiGatewayService, GatewayComponents};
