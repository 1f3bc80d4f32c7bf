//! # Capability Signer
//!
//! ## Format
//!
//! ```text
//! {base}/objects/{bucket}/{key}?op={read|write}&expires={unix secs}&signature={hex}
//! ```
//!
//! The signature is HMAC-SHA256 over the length-prefixed fields
//! `op`, `bucket`, `key`, `expires`. Verification is constant-time.

use crate::domain::errors::CapabilityError;
use crate::ports::outbound::TimeSource;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared_types::{Capability, CapabilityOperation};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// The claims a client presents alongside a capability-checked request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityClaims {
    pub operation: String,
    pub expires_at: u64,
    pub signature: String,
}

/// Mints and verifies capabilities with one process-wide secret.
#[derive(Clone)]
pub struct CapabilitySigner {
    mac: HmacSha256,
    public_base_url: String,
    time: Arc<dyn TimeSource>,
}

impl CapabilitySigner {
    pub fn new(
        secret: &[u8],
        public_base_url: impl Into<String>,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self, CapabilityError> {
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| CapabilityError::InvalidKey)?;
        Ok(Self {
            mac,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            time,
        })
    }

    fn sign(&self, operation: &str, bucket: &str, key: &str, expires_at: u64) -> HmacSha256 {
        let mut mac = self.mac.clone();
        for field in [operation.as_bytes(), bucket.as_bytes(), key.as_bytes()] {
            mac.update(&(field.len() as u64).to_le_bytes());
            mac.update(field);
        }
        mac.update(&expires_at.to_le_bytes());
        mac
    }

    /// Grant `operation` on `bucket/key` for `ttl`.
    #[must_use]
    pub fn presign(
        &self,
        operation: CapabilityOperation,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Capability {
        let expires_at = self.time.now_secs().saturating_add(ttl.as_secs());
        let signature = hex::encode(
            self.sign(operation.as_str(), bucket, key, expires_at)
                .finalize()
                .into_bytes(),
        );
        let url = format!(
            "{}/objects/{}/{}?op={}&expires={}&signature={}",
            self.public_base_url,
            bucket,
            key,
            operation.as_str(),
            expires_at,
            signature
        );

        debug!(op = %operation, bucket, key, expires_at, "Capability issued");
        Capability {
            operation,
            bucket: bucket.to_string(),
            object_key: key.to_string(),
            expires_at,
            signature,
            url,
        }
    }

    /// Check that `claims` grant `required` on exactly `bucket/key` right now.
    pub fn verify(
        &self,
        required: CapabilityOperation,
        bucket: &str,
        key: &str,
        claims: &CapabilityClaims,
    ) -> Result<(), CapabilityError> {
        if claims.operation != required.as_str() {
            return Err(CapabilityError::OperationMismatch {
                granted: claims.operation.clone(),
                required: required.as_str().to_string(),
            });
        }

        let signature =
            hex::decode(&claims.signature).map_err(|_| CapabilityError::MalformedSignature)?;
        self.sign(&claims.operation, bucket, key, claims.expires_at)
            .verify_slice(&signature)
            .map_err(|_| CapabilityError::InvalidSignature)?;

        let now = self.time.now_secs();
        if now > claims.expires_at {
            return Err(CapabilityError::Expired {
                expires_at: claims.expires_at,
                now,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for CapabilitySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilitySigner")
            .field("public_base_url", &self.public_base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MockTimeSource;
    use proptest::prelude::*;

    const SECRET: [u8; 32] = [7u8; 32];

    fn signer(time: Arc<MockTimeSource>) -> CapabilitySigner {
        CapabilitySigner::new(&SECRET, "http://localhost:8080/", time).unwrap()
    }

    fn claims(cap: &Capability) -> CapabilityClaims {
        CapabilityClaims {
            operation: cap.operation.as_str().to_string(),
            expires_at: cap.expires_at,
            signature: cap.signature.clone(),
        }
    }

    #[test]
    fn test_presign_url_shape() {
        let time = Arc::new(MockTimeSource::new(1_000));
        let cap = signer(time).presign(
            CapabilityOperation::Write,
            "input",
            "image-1.png",
            Duration::from_secs(60),
        );
        assert_eq!(cap.expires_at, 1_060);
        assert!(cap.url.starts_with(
            "http://localhost:8080/objects/input/image-1.png?op=write&expires=1060&signature="
        ));
        assert_eq!(cap.signature.len(), 64);
    }

    #[test]
    fn test_verify_accepts_exact_scope() {
        let time = Arc::new(MockTimeSource::new(1_000));
        let signer = signer(time);
        let cap = signer.presign(CapabilityOperation::Read, "out", "image-1.gif", Duration::from_secs(60));
        assert!(signer
            .verify(CapabilityOperation::Read, "out", "image-1.gif", &claims(&cap))
            .is_ok());
    }

    #[test]
    fn test_verify_rejects_other_object() {
        let time = Arc::new(MockTimeSource::new(1_000));
        let signer = signer(time);
        let cap = signer.presign(CapabilityOperation::Write, "in", "image-1.png", Duration::from_secs(60));

        assert_eq!(
            signer.verify(CapabilityOperation::Write, "in", "image-2.png", &claims(&cap)),
            Err(CapabilityError::InvalidSignature)
        );
        assert_eq!(
            signer.verify(CapabilityOperation::Write, "out", "image-1.png", &claims(&cap)),
            Err(CapabilityError::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_rejects_wrong_operation() {
        let time = Arc::new(MockTimeSource::new(1_000));
        let signer = signer(time);
        let cap = signer.presign(CapabilityOperation::Write, "in", "image-1.png", Duration::from_secs(60));
        assert!(matches!(
            signer.verify(CapabilityOperation::Read, "in", "image-1.png", &claims(&cap)),
            Err(CapabilityError::OperationMismatch { .. })
        ));

        // Rewriting the op claim breaks the signature.
        let mut forged = claims(&cap);
        forged.operation = "read".into();
        assert_eq!(
            signer.verify(CapabilityOperation::Read, "in", "image-1.png", &forged),
            Err(CapabilityError::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_rejects_after_expiry() {
        let time = Arc::new(MockTimeSource::new(1_000));
        let signer = signer(time.clone());
        let cap = signer.presign(CapabilityOperation::Read, "out", "image-1.png", Duration::from_secs(60));

        time.set(1_060);
        assert!(signer
            .verify(CapabilityOperation::Read, "out", "image-1.png", &claims(&cap))
            .is_ok());
        time.set(1_061);
        assert_eq!(
            signer.verify(CapabilityOperation::Read, "out", "image-1.png", &claims(&cap)),
            Err(CapabilityError::Expired {
                expires_at: 1_060,
                now: 1_061
            })
        );
    }

    #[test]
    fn test_verify_rejects_extended_expiry_and_bad_hex() {
        let time = Arc::new(MockTimeSource::new(1_000));
        let signer = signer(time);
        let cap = signer.presign(CapabilityOperation::Read, "out", "image-1.png", Duration::from_secs(60));

        let mut extended = claims(&cap);
        extended.expires_at += 3_600;
        assert_eq!(
            signer.verify(CapabilityOperation::Read, "out", "image-1.png", &extended),
            Err(CapabilityError::InvalidSignature)
        );

        let mut garbage = claims(&cap);
        garbage.signature = "zz".into();
        assert_eq!(
            signer.verify(CapabilityOperation::Read, "out", "image-1.png", &garbage),
            Err(CapabilityError::MalformedSignature)
        );
    }

    proptest! {
        #[test]
        fn prop_capability_never_covers_another_key(a in "image-[a-z0-9]{1,16}\\.png", b in "image-[a-z0-9]{1,16}\\.png") {
            prop_assume!(a != b);
            let time = Arc::new(MockTimeSource::new(0));
            let signer = signer(time);
            let cap = signer.presign(CapabilityOperation::Write, "in", &a, Duration::from_secs(60));
            prop_assert!(signer.verify(CapabilityOperation::Write, "in", &b, &claims(&cap)).is_err());
        }
    }
}
