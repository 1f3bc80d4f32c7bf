//! # Capability Issuer (it-03)
//!
//! Turns an upload request into a job.
//!
//! ## Flow
//!
//! ```text
//! GenerateUrlRequest ──suffix allow-list──→ UnsupportedMediaType (no side effects)
//!        │
//!        ▼
//! mint "image-<uuid><suffix>" → create JobRecord{processing} → presign write (60s)
//! ```
//!
//! The job record is committed before the capability is returned; the
//! transform worker and the access authorizer both rely on it existing.

pub mod domain;
pub mod service;

pub use domain::{GenerateUrlRequest, IssueError, IssuedCapability, IssuerConfig};
pub use service::CapabilityIssuer;
