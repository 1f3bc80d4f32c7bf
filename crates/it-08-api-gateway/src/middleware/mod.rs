//! Middleware stack.
//!
//! Layer order: Request → CORS → Tracing → Identity → (Timeout → Authorizer) → Handler
//!
//! The timeout is a route layer on `/generate-url` and `/access-object`.
//! The authorizer gate is a route layer on `GET /access-object` only.

pub mod authorizer;
pub mod cors;
pub mod identity;
pub mod timeout;
pub mod tracing;

pub use authorizer::{AuthorizerLayer, ObjectNameQuery, OBJECT_NAME_PARAM};
pub use cors::create_cors_layer;
pub use identity::{ClientIdentity, IdentityLayer};
pub use timeout::TimeoutLayer;
pub use self::tracing::TracingLayer;
