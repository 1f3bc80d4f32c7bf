//! Object-created notification envelope.
//!
//! This is the JSON body that travels from object storage through the topic
//! into the transform queue and, on exhaustion, the dead-letter queue.

use serde::{Deserialize, Serialize};

/// Top-level notification body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StorageEventRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEventRecord {
    #[serde(rename = "eventTime", default)]
    pub event_time: String,
    pub s3: StorageEntity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntity {
    pub key: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "eTag", default)]
    pub etag: String,
    #[serde(default)]
    pub sequencer: String,
}

impl StorageEvent {
    /// Envelope for a single object-created event.
    pub fn object_created(
        bucket: impl Into<String>,
        key: impl Into<String>,
        size: u64,
        etag: impl Into<String>,
        sequencer: impl Into<String>,
        event_time: impl Into<String>,
    ) -> Self {
        Self {
            records: vec![StorageEventRecord {
                event_time: event_time.into(),
                s3: StorageEntity {
                    bucket: BucketEntity { name: bucket.into() },
                    object: ObjectEntity {
                        key: key.into(),
                        size,
                        etag: etag.into(),
                        sequencer: sequencer.into(),
                    },
                },
            }],
        }
    }

    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The referenced record, if the envelope references exactly one object.
    #[must_use]
    pub fn single_record(&self) -> Option<&StorageEventRecord> {
        match self.records.as_slice() {
            [record] => Some(record),
            _ => None,
        }
    }
}
