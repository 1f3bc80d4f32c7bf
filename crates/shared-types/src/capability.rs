//! Capability tokens.
//!
//! A capability grants exactly one operation on exactly one object until
//! `expires_at`. Signing and verification live in `it-02-object-storage`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The single operation a capability grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityOperation {
    Read,
    Write,
}

impl CapabilityOperation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }

    /// HTTP verb accepted for this operation.
    #[must_use]
    pub const fn http_method(&self) -> &'static str {
        match self {
            Self::Read => "GET",
            Self::Write => "PUT",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "read" => Some(Self::Read),
            "write" => Some(Self::Write),
            _ => None,
        }
    }
}

impl fmt::Display for CapabilityOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signed, time-boxed, single-object grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub operation: CapabilityOperation,
    pub bucket: String,
    pub object_key: String,
    /// Unix seconds after which the capability is rejected.
    pub expires_at: u64,
    /// Hex HMAC-SHA256.
    pub signature: String,
    /// Fully-qualified URL presented by the client.
    pub url: String,
}

impl Capability {
    #[must_use]
    pub fn is_expired(&self, now_secs: u64) -> bool {
        now_secs > self.expires_at
    }
}
