//! # Job Lifecycle Entities
//!
//! Core data model for the pipeline.
//!
//! ## Job Record
//!
//! ```text
//! pk         = "image-<uuid><suffix>"   (object identifier, never reused)
//! sk         = "metadata"               (fixed sub-key)
//! SourceIP   = network identity at issuance (immutable)
//! Status     = processing | processed | broken
//! ContentType= ".jpg" | ".jpeg" | ".png" | ".gif" (immutable)
//! Transforms = [{Name, Params[]}]       (ordered, immutable)
//! ```
//!
//! ## Status State Machine
//!
//! ```text
//! [processing] ──transform ok──→ [processed]
//!      │
//!      └──── retries exhausted ──→ [broken]
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;

/// Prefix carried by every issued object identifier.
///
/// Storage notifications are filtered on this prefix.
pub const OBJECT_KEY_PREFIX: &str = "image-";

/// Widest accepted input image.
pub const MAX_IMAGE_WIDTH: u32 = 7680;

/// Tallest accepted input image.
pub const MAX_IMAGE_HEIGHT: u32 = 4320;

/// Largest accepted input object: one RGBA frame at the maximum dimensions.
pub const MAX_IMAGE_SIZE_BYTES: u64 = MAX_IMAGE_WIDTH as u64 * MAX_IMAGE_HEIGHT as u64 * 4;

/// Fixed sub-key of every job record.
pub const METADATA_SORT_KEY: &str = "metadata";

/// Persisted attribute names of a job record.
pub mod attributes {
    pub const PARTITION_KEY: &str = "pk";
    pub const SORT_KEY: &str = "sk";
    pub const SOURCE_IDENTITY: &str = "SourceIP";
    pub const STATUS: &str = "Status";
    pub const CONTENT_TYPE: &str = "ContentType";
    pub const TRANSFORMS: &str = "Transforms";
}

// =============================================================================
// OBJECT IDENTIFIER
// =============================================================================

/// Globally unique identifier of an uploaded object.
///
/// Doubles as the object key in both the input and the output store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Mint a fresh identifier: prefix + random UUID + validated suffix.
    #[must_use]
    pub fn generate(content_type: ContentType) -> Self {
        Self(format!(
            "{}{}{}",
            OBJECT_KEY_PREFIX,
            Uuid::new_v4(),
            content_type.suffix()
        ))
    }

    /// Wrap an identifier received from a client or a notification.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if the identifier carries the notification prefix.
    #[must_use]
    pub fn has_issued_prefix(&self) -> bool {
        self.0.starts_with(OBJECT_KEY_PREFIX)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// =============================================================================
// ITEM KEY
// =============================================================================

/// Two-part key of the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    #[serde(rename = "pk")]
    pub partition: String,
    #[serde(rename = "sk")]
    pub sort: String,
}

impl ItemKey {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }

    /// Key of the job record for `object_id`.
    #[must_use]
    pub fn metadata(object_id: &ObjectId) -> Self {
        Self::new(object_id.as_str(), METADATA_SORT_KEY)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.partition, self.sort)
    }
}

// =============================================================================
// JOB STATUS
// =============================================================================

/// Externally observable status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Issued; waiting for upload or transform.
    Processing,
    /// Transform succeeded; output object is readable.
    Processed,
    /// Redelivery exhausted; never retried again.
    Broken,
}

impl JobStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Broken => "broken",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "processing" => Some(Self::Processing),
            "processed" => Some(Self::Processed),
            "broken" => Some(Self::Broken),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Broken)
    }

    /// Only `processing → processed` and `processing → broken` are valid.
    #[must_use]
    pub const fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Processing, Self::Processed) | (Self::Processing, Self::Broken)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONTENT TYPE
// =============================================================================

/// Allow-listed object suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = ".jpg")]
    Jpg,
    #[serde(rename = ".jpeg")]
    Jpeg,
    #[serde(rename = ".png")]
    Png,
    #[serde(rename = ".gif")]
    Gif,
}

impl ContentType {
    /// The allow-list, in matching order.
    pub const ALL: [ContentType; 4] = [Self::Jpg, Self::Jpeg, Self::Png, Self::Gif];

    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Jpg => ".jpg",
            Self::Jpeg => ".jpeg",
            Self::Png => ".png",
            Self::Gif => ".gif",
        }
    }

    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpg | Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }

    /// Derive the content type from a requested object name.
    ///
    /// Matching is on the exact, case-sensitive suffix.
    #[must_use]
    pub fn from_object_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|content_type| name.ends_with(content_type.suffix()))
    }

    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|content_type| content_type.suffix() == suffix)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

// =============================================================================
// TRANSFORM CHAIN
// =============================================================================

/// One step of a client-supplied transform chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Params", default)]
    pub params: Vec<String>,
}

impl Transform {
    pub fn new<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// A parameterless step.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }
}

// =============================================================================
// SOURCE IDENTITY
// =============================================================================

/// Network identity of a requester, compared by exact string match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceIdentity(String);

impl SourceIdentity {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<IpAddr> for SourceIdentity {
    fn from(ip: IpAddr) -> Self {
        Self(ip.to_string())
    }
}

impl fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// JOB RECORD
// =============================================================================

/// The persisted status/metadata entry for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "pk")]
    pub object_id: ObjectId,
    #[serde(rename = "sk")]
    pub sort_key: String,
    #[serde(rename = "SourceIP")]
    pub source_identity: SourceIdentity,
    #[serde(rename = "Status")]
    pub status: JobStatus,
    #[serde(rename = "ContentType")]
    pub content_type: ContentType,
    #[serde(rename = "Transforms", default)]
    pub transforms: Vec<Transform>,
}

impl JobRecord {
    /// A freshly issued record in `processing`.
    #[must_use]
    pub fn issued(
        object_id: ObjectId,
        source_identity: SourceIdentity,
        content_type: ContentType,
        transforms: Vec<Transform>,
    ) -> Self {
        Self {
            object_id,
            sort_key: METADATA_SORT_KEY.to_string(),
            source_identity,
            status: JobStatus::Processing,
            content_type,
            transforms,
        }
    }

    #[must_use]
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.object_id.as_str(), self.sort_key.as_str())
    }
}
