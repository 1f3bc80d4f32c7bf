//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by object storage and the capability signer.

use crate::domain::errors::ObjectStoreError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: Option<String>,
    /// Hex SHA-256 of `body`.
    pub etag: String,
}

/// Abstract interface for object storage.
///
/// Testing and single-node: `InMemoryObjectStore` (adapters/memory.rs)
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `bucket/key`, replacing any previous object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), ObjectStoreError>;

    /// Fetch the object at `bucket/key`.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, ObjectStoreError>;
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Current time in seconds since the Unix epoch.
    fn now_secs(&self) -> u64;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Settable clock for tests.
#[derive(Debug, Default)]
pub struct MockTimeSource {
    now: AtomicU64,
}

impl MockTimeSource {
    #[must_use]
    pub fn new(now_secs: u64) -> Self {
        Self {
            now: AtomicU64::new(now_secs),
        }
    }

    pub fn set(&self, now_secs: u64) {
        self.now.store(now_secs, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for MockTimeSource {
    fn now_secs(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
