//! # Access Resolver (it-07)
//!
//! Runs after the access authorizer allowed a read.
//!
//! | Stored status | Outcome |
//! |---------------|---------|
//! | `processing` | [`AccessOutcome::TryLater`] (425) |
//! | `broken` | [`AccessOutcome::Broken`] (400, `object_broken`) |
//! | `processed` | [`AccessOutcome::Ready`] with a 60s read capability |
//! | absent, no status, unknown status | [`ResolveError::InternalConsistency`] |
//!
//! The last row cannot happen while the job store invariants hold: the
//! authorizer saw the record moments earlier and records are never deleted.

pub mod domain;
pub mod service;

pub use domain::{AccessOutcome, ConsistencyViolation, ResolveError, ResolverConfig};
pub use service::AccessResolver;
