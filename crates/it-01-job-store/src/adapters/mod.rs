//! # Adapters Layer
//!
//! - `rocksdb` - Persistent metadata store (feature `rocksdb`)

#[cfg(feature = "rocksdb")]
pub mod rocksdb;
