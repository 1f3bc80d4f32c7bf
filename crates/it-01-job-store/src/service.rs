//! # Job Store Service
//!
//! Typed repository over a [`MetadataStore`]. Every pipeline component reads
//! and writes job records through this type.
//!
//! ## Status Guard
//!
//! A status update succeeds only if the record exists and its current status
//! is `processing` or already equals the target. Re-applying the same
//! terminal status is a no-op success; moving between terminal states fails.

use crate::domain::condition::{Condition, Item, ReadConsistency};
use crate::domain::errors::{JobStoreError, StoreError};
use crate::domain::item::JobItem;
use crate::ports::outbound::MetadataStore;
use serde_json::Value;
use shared_types::{attributes, ItemKey, JobRecord, JobStatus, ObjectId};
use std::sync::Arc;
use tracing::{debug, info};

/// The job record repository.
#[derive(Clone)]
pub struct JobStore {
    store: Arc<dyn MetadataStore>,
}

impl JobStore {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Persist a freshly issued record. Fails if one already exists.
    pub async fn create(&self, record: &JobRecord) -> Result<(), JobStoreError> {
        let item = encode_item(serde_json::to_value(record))?;

        self.store
            .put_item(&record.key(), item, Condition::KeyNotExists)
            .await
            .map_err(|e| match e {
                StoreError::ConditionFailed { .. } => JobStoreError::AlreadyExists {
                    object_id: record.object_id.clone(),
                },
                other => other.into(),
            })?;

        debug!(object_id = %record.object_id, status = %record.status, "Job record created");
        Ok(())
    }

    /// Strongly consistent read of a record.
    pub async fn fetch(&self, object_id: &ObjectId) -> Result<Option<JobItem>, JobStoreError> {
        let item = self
            .store
            .get_item(&ItemKey::metadata(object_id), ReadConsistency::Strong)
            .await?;
        Ok(item.map(|item| JobItem::new(object_id.clone(), item)))
    }

    /// `processing → processed`
    pub async fn mark_processed(&self, object_id: &ObjectId) -> Result<(), JobStoreError> {
        self.transition(object_id, JobStatus::Processed).await
    }

    /// `processing → broken`
    pub async fn mark_broken(&self, object_id: &ObjectId) -> Result<(), JobStoreError> {
        self.transition(object_id, JobStatus::Broken).await
    }

    async fn transition(&self, object_id: &ObjectId, target: JobStatus) -> Result<(), JobStoreError> {
        let mut set = Item::new();
        set.insert(
            attributes::STATUS.to_string(),
            Value::String(target.as_str().to_string()),
        );
        let condition = Condition::attribute_in(
            attributes::STATUS,
            [JobStatus::Processing.as_str(), target.as_str()],
        );

        match self
            .store
            .update_item(&ItemKey::metadata(object_id), set, condition)
            .await
        {
            Ok(_) => {
                info!(object_id = %object_id, status = %target, "Job status updated");
                Ok(())
            }
            Err(StoreError::ConditionFailed { .. }) => Err(self.explain_rejection(object_id, target).await),
            Err(e) => Err(e.into()),
        }
    }

    /// Distinguish a missing record from a forbidden transition.
    async fn explain_rejection(&self, object_id: &ObjectId, target: JobStatus) -> JobStoreError {
        match self.fetch(object_id).await {
            Ok(None) => JobStoreError::NotFound {
                object_id: object_id.clone(),
            },
            Ok(Some(item)) => JobStoreError::InvalidTransition {
                object_id: object_id.clone(),
                from: item.raw_status().unwrap_or("<missing>").to_string(),
                to: target.to_string(),
            },
            Err(e) => e,
        }
    }
}

/// Records are stored as attribute maps; anything else is an encoding error.
fn encode_item(value: serde_json::Result<Value>) -> Result<Item, StoreError> {
    match value {
        Ok(Value::Object(item)) => Ok(item),
        Ok(other) => Err(StoreError::Encoding {
            message: format!("record encoded as non-object: {other}"),
        }),
        Err(e) => Err(StoreError::Encoding {
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::InMemoryMetadataStore;
    use shared_types::{ContentType, SourceIdentity, Transform};

    fn store() -> (JobStore, Arc<InMemoryMetadataStore>) {
        let backend = Arc::new(InMemoryMetadataStore::new());
        (JobStore::new(backend.clone()), backend)
    }

    fn record() -> JobRecord {
        JobRecord::issued(
            ObjectId::generate(ContentType::Jpeg),
            SourceIdentity::new("198.51.100.4"),
            ContentType::Jpeg,
            vec![Transform::named("grayscale")],
        )
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let (store, _) = store();
        let record = record();
        store.create(&record).await.unwrap();

        let fetched = store.fetch(&record.object_id).await.unwrap().unwrap();
        assert_eq!(fetched.status(), Some(JobStatus::Processing));
        assert_eq!(fetched.into_record().unwrap(), record);
    }

    #[tokio::test]
    async fn test_create_is_exactly_once() {
        let (store, backend) = store();
        let record = record();
        store.create(&record).await.unwrap();

        let err = store.create(&record).await.unwrap_err();
        assert!(matches!(err, JobStoreError::AlreadyExists { .. }));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_non_object_encoding_is_rejected() {
        for value in [Value::Null, Value::from("image-a.png"), Value::from(vec![1, 2])] {
            assert!(matches!(encode_item(Ok(value)), Err(StoreError::Encoding { .. })));
        }
        let item = encode_item(serde_json::to_value(record())).unwrap();
        assert!(item.contains_key(attributes::STATUS));
    }

    #[tokio::test]
    async fn test_fetch_missing_is_none() {
        let (store, _) = store();
        assert!(store.fetch(&ObjectId::new("image-nope.png")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_missing_record_fails_without_creating() {
        let (store, backend) = store();
        let id = ObjectId::new("image-ghost.png");

        let err = store.mark_broken(&id).await.unwrap_err();
        assert!(matches!(err, JobStoreError::NotFound { .. }));
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_terminal_status_is_final() {
        let (store, _) = store();
        let record = record();
        store.create(&record).await.unwrap();
        store.mark_processed(&record.object_id).await.unwrap();

        // Same target again is idempotent.
        store.mark_processed(&record.object_id).await.unwrap();

        let err = store.mark_broken(&record.object_id).await.unwrap_err();
        assert!(matches!(
            err,
            JobStoreError::InvalidTransition { ref from, ref to, .. } if from == "processed" && to == "broken"
        ));

        let fetched = store.fetch(&record.object_id).await.unwrap().unwrap();
        assert_eq!(fetched.status(), Some(JobStatus::Processed));
    }

    #[tokio::test]
    async fn test_removed_record_is_not_resurrected() {
        let (store, backend) = store();
        let record = record();
        store.create(&record).await.unwrap();
        backend.remove(&record.key());

        assert!(matches!(
            store.mark_processed(&record.object_id).await,
            Err(JobStoreError::NotFound { .. })
        ));
        assert!(backend.is_empty());
    }
}
