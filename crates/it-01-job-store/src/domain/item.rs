//! Typed view over a stored job record.
//!
//! Readers tolerate partial records: every accessor returns `None` for a
//! missing or mistyped attribute, and the caller decides whether that is a
//! denial, an item failure or an internal-consistency error.

use crate::domain::condition::Item;
use crate::domain::errors::JobStoreError;
use serde_json::Value;
use shared_types::{attributes, ContentType, JobRecord, JobStatus, ObjectId, SourceIdentity, Transform};

#[derive(Debug, Clone, PartialEq)]
pub struct JobItem {
    key: ObjectId,
    item: Item,
}

impl JobItem {
    pub(crate) fn new(key: ObjectId, item: Item) -> Self {
        Self { key, item }
    }

    fn string_attr(&self, name: &str) -> Option<&str> {
        self.item.get(name).and_then(Value::as_str)
    }

    /// The identifier stored in the record, if present and non-empty.
    #[must_use]
    pub fn object_id(&self) -> Option<ObjectId> {
        self.string_attr(attributes::PARTITION_KEY)
            .filter(|id| !id.is_empty())
            .map(ObjectId::from)
    }

    #[must_use]
    pub fn source_identity(&self) -> Option<SourceIdentity> {
        self.string_attr(attributes::SOURCE_IDENTITY)
            .map(SourceIdentity::new)
    }

    /// Raw status attribute.
    #[must_use]
    pub fn raw_status(&self) -> Option<&str> {
        self.string_attr(attributes::STATUS)
    }

    #[must_use]
    pub fn status(&self) -> Option<JobStatus> {
        self.raw_status().and_then(JobStatus::parse)
    }

    #[must_use]
    pub fn content_type(&self) -> Option<ContentType> {
        self.string_attr(attributes::CONTENT_TYPE)
            .and_then(ContentType::from_suffix)
    }

    /// The transform chain in stored order. A missing attribute is an empty chain.
    pub fn transforms(&self) -> Result<Vec<Transform>, JobStoreError> {
        match self.item.get(attributes::TRANSFORMS) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                JobStoreError::Malformed {
                    object_id: self.key.clone(),
                    reason: format!("transforms: {e}"),
                }
            }),
        }
    }

    /// Decode into a fully-typed record.
    pub fn into_record(self) -> Result<JobRecord, JobStoreError> {
        let key = self.key;
        serde_json::from_value(Value::Object(self.item)).map_err(|e| JobStoreError::Malformed {
            object_id: key,
            reason: e.to_string(),
        })
    }

    #[must_use]
    pub fn as_item(&self) -> &Item {
        &self.item
    }
}
