//! Device fingerprints for Normal credential codes.
//!
//! A Normal code starts with a short digest of the device id it was issued
//! for. Clients recompute the digest from their own device id to reject
//! codes minted for another device. The digest is only a recognizable
//! fingerprint; it does not resist collision or preimage attacks.

use crate::error::{LicenseError, LicenseResult};
use crate::master::{is_segment, normalize_code};
use crate::{CODE_DELIMITER, SEGMENT_LEN};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Returns the 8-character uppercase hex fingerprint of a device id.
#[must_use]
pub fn device_digest(device_id: &str) -> String {
    let digest = Md5::digest(device_id.as_bytes());
    let mut hex = hex::encode_upper(digest);
    hex.truncate(SEGMENT_LEN);
    hex
}

/// A parsed Normal code: `{DEVICE8}-{RAND8}-{RAND8}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalCode {
    raw: String,
    device_digest: String,
}

impl NormalCode {
    /// Assembles a Normal code for `device_id` from two random segments.
    #[must_use]
    pub fn assemble(device_id: &str, suffix_a: &str, suffix_b: &str) -> Self {
        let device_digest = device_digest(device_id);
        let raw = [device_digest.as_str(), suffix_a, suffix_b].join(&CODE_DELIMITER.to_string());
        Self { raw, device_digest }
    }

    /// Parses a Normal code. Input is normalized first.
    pub fn parse(code: &str) -> LicenseResult<Self> {
        let raw = normalize_code(code);
        let parts: Vec<&str> = raw.split(CODE_DELIMITER).collect();
        if parts.len() != 3 || !parts.iter().all(|p| is_segment(p)) {
            return Err(LicenseError::InvalidCodeFormat(
                "normal code must be three 8-character alphanumeric segments".to_string(),
            ));
        }
        Ok(Self {
            device_digest: parts[0].to_string(),
            raw,
        })
    }

    /// Returns true if this code was issued for `device_id`.
    #[must_use]
    pub fn matches_device(&self, device_id: &str) -> bool {
        self.device_digest == device_digest(device_id)
    }

    /// Returns the normalized code string.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the embedded device fingerprint.
    #[must_use]
    pub fn device_digest(&self) -> &str {
        &self.device_digest
    }
}
