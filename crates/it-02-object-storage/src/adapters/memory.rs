//! In-memory object store.
//!
//! Every successful write whose key matches a notification rule publishes
//! one storage notification to that rule's publisher.

use crate::domain::errors::ObjectStoreError;
use crate::ports::outbound::{ObjectStore, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use shared_bus::MessagePublisher;
use shared_types::StorageEvent;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Publish a notification for objects created in `bucket` under `prefix`.
#[derive(Clone)]
pub struct NotificationRule {
    pub bucket: String,
    pub prefix: String,
    pub publisher: Arc<dyn MessagePublisher>,
}

impl NotificationRule {
    fn matches(&self, bucket: &str, key: &str) -> bool {
        self.bucket == bucket && key.starts_with(&self.prefix)
    }
}

/// In-memory buckets.
pub struct InMemoryObjectStore {
    buckets: RwLock<HashMap<String, HashMap<String, StoredObject>>>,
    rules: RwLock<Vec<NotificationRule>>,
    sequencer: AtomicU64,
}

impl InMemoryObjectStore {
    /// Create a store holding the given (empty) buckets.
    pub fn new<I, S>(buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            buckets: RwLock::new(
                buckets
                    .into_iter()
                    .map(|name| (name.into(), HashMap::new()))
                    .collect(),
            ),
            rules: RwLock::new(Vec::new()),
            sequencer: AtomicU64::new(0),
        }
    }

    /// Register a creation-notification rule.
    pub fn add_notification(&self, rule: NotificationRule) {
        debug!(bucket = %rule.bucket, prefix = %rule.prefix, "Notification rule added");
        self.rules.write().push(rule);
    }

    #[must_use]
    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.buckets
            .read()
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(key))
    }

    #[must_use]
    pub fn object_count(&self, bucket: &str) -> usize {
        self.buckets.read().get(bucket).map_or(0, HashMap::len)
    }

    async fn notify(&self, bucket: &str, key: &str, size: u64, etag: &str) -> Result<(), ObjectStoreError> {
        let rules: Vec<NotificationRule> = self
            .rules
            .read()
            .iter()
            .filter(|rule| rule.matches(bucket, key))
            .cloned()
            .collect();
        if rules.is_empty() {
            return Ok(());
        }

        let sequence = self.sequencer.fetch_add(1, Ordering::SeqCst) + 1;
        let event = StorageEvent::object_created(
            bucket,
            key,
            size,
            etag,
            format!("{sequence:016X}"),
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        let body = event.to_json().map_err(|e| ObjectStoreError::Notification {
            message: e.to_string(),
        })?;

        for rule in rules {
            let receivers = rule.publisher.publish(body.clone()).await;
            if receivers == 0 {
                warn!(bucket, key, "Object-created notification had no receivers");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), ObjectStoreError> {
        let etag = hex::encode(Sha256::digest(&body));
        let size = body.len() as u64;
        {
            let mut buckets = self.buckets.write();
            let objects = buckets
                .get_mut(bucket)
                .ok_or_else(|| ObjectStoreError::NoSuchBucket {
                    bucket: bucket.to_string(),
                })?;
            objects.insert(
                key.to_string(),
                StoredObject {
                    body,
                    content_type: content_type.map(str::to_string),
                    etag: etag.clone(),
                },
            );
        }
        debug!(bucket, key, size, "Object stored");

        self.notify(bucket, key, size, &etag).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, ObjectStoreError> {
        let buckets = self.buckets.read();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| ObjectStoreError::NoSuchBucket {
                bucket: bucket.to_string(),
            })?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NoSuchKey {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}
