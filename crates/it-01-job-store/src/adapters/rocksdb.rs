//! # RocksDB Metadata Store
//!
//! Persistent implementation of the [`MetadataStore`] port.
//!
//! ## Layout
//!
//! - key: `partition \0 sort`
//! - value: the item as JSON
//!
//! Conditional writes hold the write lock across read-check-write, so
//! conditions are evaluated atomically with respect to every other writer in
//! the process.

use crate::domain::condition::{Condition, Item, ReadConsistency};
use crate::domain::errors::StoreError;
use crate::ports::outbound::{condition_failed, merged, with_key, MetadataStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use ::rocksdb::{DBCompressionType, Options, WriteOptions, DB};
use shared_types::ItemKey;
use std::sync::Arc;

/// RocksDB configuration
#[derive(Debug, Clone)]
pub struct RocksDbMetadataConfig {
    /// Path to the database directory
    pub path: String,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// Enable fsync after each write (default: true for durability)
    pub sync_writes: bool,
}

impl Default for RocksDbMetadataConfig {
    fn default() -> Self {
        Self {
            path: "./data/metadata".to_string(),
            write_buffer_size: 16 * 1024 * 1024, // 16MB
            sync_writes: true,
        }
    }
}

impl RocksDbMetadataConfig {
    /// Create config for testing (small buffers, no sync)
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            write_buffer_size: 1024 * 1024, // 1MB
            sync_writes: false,
        }
    }
}

/// RocksDB-backed metadata store
pub struct RocksDbMetadataStore {
    db: Arc<RwLock<DB>>,
    config: RocksDbMetadataConfig,
}

impl RocksDbMetadataStore {
    /// Open or create the database
    pub fn open(config: RocksDbMetadataConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(DBCompressionType::Snappy);

        let db = DB::open(&opts, &config.path).map_err(|e| StoreError::Backend {
            message: format!("Failed to open RocksDB: {}", e),
        })?;

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            config,
        })
    }

    fn encode_key(key: &ItemKey) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(key.partition.len() + key.sort.len() + 1);
        bytes.extend_from_slice(key.partition.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(key.sort.as_bytes());
        bytes
    }

    fn read(db: &DB, key: &ItemKey) -> Result<Option<Item>, StoreError> {
        let raw = db
            .get(Self::encode_key(key))
            .map_err(|e| StoreError::Backend {
                message: e.to_string(),
            })?;
        raw.map(|bytes| {
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Encoding {
                message: e.to_string(),
            })
        })
        .transpose()
    }

    fn write(&self, db: &DB, key: &ItemKey, item: &Item) -> Result<(), StoreError> {
        let value = serde_json::to_vec(item).map_err(|e| StoreError::Encoding {
            message: e.to_string(),
        })?;
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        db.put_opt(Self::encode_key(key), value, &write_opts)
            .map_err(|e| StoreError::Backend {
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl MetadataStore for RocksDbMetadataStore {
    async fn get_item(
        &self,
        key: &ItemKey,
        _consistency: ReadConsistency,
    ) -> Result<Option<Item>, StoreError> {
        let db = self.db.read();
        Self::read(&db, key)
    }

    async fn put_item(&self, key: &ItemKey, item: Item, condition: Condition) -> Result<(), StoreError> {
        let db = self.db.write();
        let existing = Self::read(&db, key)?;
        if !condition.evaluate(existing.as_ref()) {
            return Err(condition_failed(key));
        }
        self.write(&db, key, &with_key(key, item))
    }

    async fn update_item(
        &self,
        key: &ItemKey,
        set: Item,
        condition: Condition,
    ) -> Result<Item, StoreError> {
        let db = self.db.write();
        let existing = Self::read(&db, key)?;
        if !condition.evaluate(existing.as_ref()) {
            return Err(condition_failed(key));
        }
        let updated = merged(key, existing, set);
        self.write(&db, key, &updated)?;
        Ok(updated)
    }
}
