//! # Object Storage (it-02)
//!
//! Input and output buckets plus the capability scheme that guards them.
//!
//! ## Responsibilities
//!
//! - Store object bytes per `(bucket, key)`
//! - Announce every created object whose key carries the configured prefix
//!   as a storage notification on a topic
//! - Mint and verify capabilities: HMAC-SHA256 signed, time-boxed,
//!   single-object, single-operation URLs
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Capability signer, errors
//! - `ports/` - `ObjectStore` and `TimeSource` driven ports
//! - `adapters/` - In-memory object store

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::memory::{InMemoryObjectStore, NotificationRule};
pub use domain::capability::{CapabilityClaims, CapabilitySigner};
pub use domain::errors::{CapabilityError, ObjectStoreError};
pub use ports::outbound::{MockTimeSource, ObjectStore, StoredObject, SystemTimeSource, TimeSource};

/// Validity of every issued capability.
pub const DEFAULT_CAPABILITY_TTL_SECS: u64 = 60;
