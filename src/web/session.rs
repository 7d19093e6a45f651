//! Tamper-evident encoding of the funnel state carried by the page.
//!
//! The state travels as `<payload>.<tag>`, both base64url without padding.
//! The tag is an HMAC-SHA256 over the encoded payload, so the visitor can
//! hold the state but not rewrite it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::common::SessionError;
use crate::funnel::FunnelController;

type HmacSha256 = Hmac<Sha256>;

/// Sealed states above this length are refused before decoding.
const MAX_SEALED_LEN: usize = 16 * 1024;

pub struct StateSeal {
    mac: HmacSha256,
}

impl StateSeal {
    pub fn new(secret: &[u8]) -> Result<Self, SessionError> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|_| SessionError::InvalidKey)?;
        Ok(Self { mac })
    }

    /// Seal with a random per-process key. States sealed by one process
    /// cannot be opened by another.
    pub fn generate() -> Result<Self, SessionError> {
        let mut key = Vec::with_capacity(32);
        key.extend_from_slice(Uuid::new_v4().as_bytes());
        key.extend_from_slice(Uuid::new_v4().as_bytes());
        Self::new(&key)
    }

    fn tag(&self, payload: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac
    }

    pub fn seal(&self, funnel: &FunnelController) -> Result<String, SessionError> {
        let json = serde_json::to_vec(funnel)
            .map_err(|e| SessionError::Encode(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let tag = URL_SAFE_NO_PAD.encode(self.tag(&payload).finalize().into_bytes());
        Ok(format!("{}.{}", payload, tag))
    }

    /// Verifies the tag, then decodes the state and checks its step order.
    pub fn open(&self, sealed: &str) -> Result<FunnelController, SessionError> {
        if sealed.len() > MAX_SEALED_LEN {
            return Err(SessionError::Malformed);
        }
        let (payload, tag) =
            sealed.split_once('.').ok_or(SessionError::Malformed)?;

        let tag = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| SessionError::Malformed)?;
        self.tag(payload)
            .verify_slice(&tag)
            .map_err(|_| SessionError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| SessionError::Malformed)?;
        let funnel: FunnelController =
            serde_json::from_slice(&json).map_err(|_| SessionError::Malformed)?;

        if !funnel.is_consistent() {
            return Err(SessionError::Inconsistent);
        }
        Ok(funnel)
    }
}
