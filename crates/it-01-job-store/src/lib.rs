//! # Job Store (it-01)
//!
//! The single source of truth for job status. One record per object
//! identifier, keyed by `(object identifier, "metadata")`.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Created exactly once | `put_item` with `KeyNotExists` |
//! | No resurrection | every status update requires the key to exist |
//! | Terminal states are final | status updates require `processing` (or the same target) |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Items, conditions, error types
//! - `ports/` - `MetadataStore` driven port and its in-memory adapter
//! - `adapters/` - RocksDB adapter (feature `rocksdb`)
//! - `service.rs` - Typed `JobStore` repository used by every component
//!
//! ## Usage
//!
//! ```ignore
//! use it_01_job_store::{InMemoryMetadataStore, JobStore};
//!
//! let store = JobStore::new(Arc::new(InMemoryMetadataStore::new()));
//! store.create(&record).await?;
//! store.mark_processed(&record.object_id).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::condition::{Condition, Item, ReadConsistency};
pub use domain::errors::{JobStoreError, StoreError};
pub use domain::item::JobItem;
pub use ports::outbound::{InMemoryMetadataStore, MetadataStore};
pub use service::JobStore;

#[cfg(feature = "rocksdb")]
pub use adapters::rocksdb::{RocksDbMetadataConfig, RocksDbMetadataStore};
