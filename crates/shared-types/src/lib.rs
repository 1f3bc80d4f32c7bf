//! # Shared Types Crate
//!
//! This crate contains the job record, the storage notification envelope and
//! the capability types used by every pipeline component.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: The persisted attribute names of a job record
//!   and the JSON shape of a storage notification are defined here only.
//! - **Closed Allow-Lists**: Content types and job statuses are enums, so a
//!   value outside the allow-list cannot be constructed in-process.
//! - **Identity Is Data**: The network identity captured at issuance is an
//!   opaque string compared byte-for-byte; no parsing happens after capture.

pub mod capability;
pub mod entities;
pub mod notification;

pub use capability::{Capability, CapabilityOperation};
pub use entities::*;
pub use notification::{BucketEntity, ObjectEntity, StorageEntity, StorageEvent, StorageEventRecord};
