//! # Access Authorizer (it-06)
//!
//! Gate in front of every object read. The caller's current network identity
//! must equal the identity recorded when the upload was issued.
//!
//! ```text
//! object-name ──→ JobStore (strong read) ──→ SourceIP == caller ? Allow : Deny
//!      │                 │                          │
//!   missing          error / absent            missing attribute
//!      └───────────────────┴───────────────────────┴──────→ Deny
//! ```
//!
//! The decision has no side effects and never returns job data; the gateway
//! only sees a policy document.

pub mod policy;
pub mod service;

pub use policy::{AuthorizerResponse, Effect, PolicyDocument, Statement, POLICY_VERSION};
pub use service::{AccessAuthorizer, DenyReason};
