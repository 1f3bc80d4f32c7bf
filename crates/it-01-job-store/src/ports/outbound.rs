//! # Outbound Ports (Driven Ports)
//!
//! The key-value metadata store the job repository runs on.

use crate::domain::condition::{Condition, Item, ReadConsistency};
use crate::domain::errors::StoreError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::{attributes, ItemKey};
use std::collections::HashMap;

/// Abstract interface for the metadata store.
///
/// Production: `RocksDbMetadataStore` (adapters/rocksdb.rs, feature `rocksdb`)
/// Testing: `InMemoryMetadataStore` (below)
///
/// Every write evaluates its [`Condition`] atomically with the write itself.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Get an item by key.
    async fn get_item(
        &self,
        key: &ItemKey,
        consistency: ReadConsistency,
    ) -> Result<Option<Item>, StoreError>;

    /// Replace the whole item at `key`.
    async fn put_item(&self, key: &ItemKey, item: Item, condition: Condition) -> Result<(), StoreError>;

    /// Set the given attributes on the item at `key`, creating it if absent
    /// and the condition allows. Returns the item after the update.
    async fn update_item(
        &self,
        key: &ItemKey,
        set: Item,
        condition: Condition,
    ) -> Result<Item, StoreError>;
}

/// Stamp the key attributes onto an item.
pub(crate) fn with_key(key: &ItemKey, mut item: Item) -> Item {
    item.insert(
        attributes::PARTITION_KEY.to_string(),
        Value::String(key.partition.clone()),
    );
    item.insert(
        attributes::SORT_KEY.to_string(),
        Value::String(key.sort.clone()),
    );
    item
}

/// Merge `set` into the existing item (or a fresh one).
pub(crate) fn merged(key: &ItemKey, existing: Option<Item>, set: Item) -> Item {
    let mut item = existing.unwrap_or_default();
    item.extend(set);
    with_key(key, item)
}

pub(crate) fn condition_failed(key: &ItemKey) -> StoreError {
    StoreError::ConditionFailed {
        key: key.to_string(),
    }
}

// =============================================================================
// ADAPTER IMPLEMENTATIONS
// Production: RocksDbMetadataStore in adapters/rocksdb.rs
// Testing: In-memory implementation below
// =============================================================================

/// In-memory metadata store.
///
/// Reads are always strongly consistent.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    items: RwLock<HashMap<ItemKey, Item>>,
}

impl InMemoryMetadataStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Remove an item outside the conditional-write path (external expiry).
    pub fn remove(&self, key: &ItemKey) -> Option<Item> {
        self.items.write().remove(key)
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn get_item(
        &self,
        key: &ItemKey,
        _consistency: ReadConsistency,
    ) -> Result<Option<Item>, StoreError> {
        Ok(self.items.read().get(key).cloned())
    }

    async fn put_item(&self, key: &ItemKey, item: Item, condition: Condition) -> Result<(), StoreError> {
        let mut items = self.items.write();
        if !condition.evaluate(items.get(key)) {
            return Err(condition_failed(key));
        }
        items.insert(key.clone(), with_key(key, item));
        Ok(())
    }

    async fn update_item(
        &self,
        key: &ItemKey,
        set: Item,
        condition: Condition,
    ) -> Result<Item, StoreError> {
        let mut items = self.items.write();
        if !condition.evaluate(items.get(key)) {
            return Err(condition_failed(key));
        }
        let updated = merged(key, items.remove(key), set);
        items.insert(key.clone(), updated.clone());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key() -> ItemKey {
        ItemKey::new("image-1.gif", "metadata")
    }

    fn attrs(value: Value) -> Item {
        match value {
            Value::Object(map) => map,
            _ => Item::new(),
        }
    }

    #[tokio::test]
    async fn test_put_stamps_key_attributes() {
        let store = InMemoryMetadataStore::new();
        store
            .put_item(&key(), attrs(json!({"Status": "processing"})), Condition::None)
            .await
            .unwrap();

        let item = store
            .get_item(&key(), ReadConsistency::Strong)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item["pk"], "image-1.gif");
        assert_eq!(item["sk"], "metadata");
    }

    #[tokio::test]
    async fn test_put_if_absent_rejects_second_write() {
        let store = InMemoryMetadataStore::new();
        store
            .put_item(&key(), Item::new(), Condition::KeyNotExists)
            .await
            .unwrap();
        let err = store
            .put_item(&key(), Item::new(), Condition::KeyNotExists)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed { .. }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_requires_existing_key() {
        let store = InMemoryMetadataStore::new();
        let err = store
            .update_item(&key(), attrs(json!({"Status": "broken"})), Condition::KeyExists)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_attributes() {
        let store = InMemoryMetadataStore::new();
        store
            .put_item(
                &key(),
                attrs(json!({"Status": "processing", "SourceIP": "1.2.3.4"})),
                Condition::None,
            )
            .await
            .unwrap();

        let updated = store
            .update_item(&key(), attrs(json!({"Status": "processed"})), Condition::KeyExists)
            .await
            .unwrap();
        assert_eq!(updated["Status"], "processed");
        assert_eq!(updated["SourceIP"], "1.2.3.4");
    }
}
