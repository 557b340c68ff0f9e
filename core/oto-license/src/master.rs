//! Master code parsing, signing and offline verification.
//!
//! Master codes use the format:
//! `MASTER-{UNLIMITED|YYYYMMDD}-{SIG8}-{SINGLE|MULTI}-{RAND8}`
//!
//! The signature is the first 8 uppercase hex characters of
//! `SHA-256("MASTER-{date}-{secret}")`. Anyone holding the secret can
//! recompute it from the embedded date alone, which is what lets clients
//! verify a code without talking to the registry.

use crate::error::{LicenseError, LicenseResult};
use crate::{CODE_DELIMITER, SEGMENT_LEN};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Leading segment of every Master code.
pub const MASTER_PREFIX: &str = "MASTER";

/// Date component used by Master codes that never expire.
pub const UNLIMITED_MARKER: &str = "UNLIMITED";

/// Secret compiled into shipped clients.
pub const DEFAULT_SHARED_SECRET: &str = "OtoServiceMaster2025SecretKey";

const DATE_FORMAT: &str = "%Y%m%d";

/// The secret mixed into Master signatures.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    /// Wraps a secret value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl Default for SharedSecret {
    fn default() -> Self {
        Self::new(DEFAULT_SHARED_SECRET)
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Whether a Master credential may be redeemed once or many times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseType {
    /// Redeemable once, then consumed.
    Single,
    /// Redeemable any number of times.
    Multi,
}

impl UseType {
    /// Maps a single-use flag to a use type.
    #[must_use]
    pub const fn from_single_use(single_use: bool) -> Self {
        if single_use { Self::Single } else { Self::Multi }
    }

    /// Returns true for [`UseType::Single`].
    #[must_use]
    pub const fn is_single(&self) -> bool {
        matches!(self, Self::Single)
    }

    /// The tag embedded in the code.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Single => "SINGLE",
            Self::Multi => "MULTI",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "SINGLE" => Some(Self::Single),
            "MULTI" => Some(Self::Multi),
            _ => None,
        }
    }
}

/// The date segment of a Master code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateComponent {
    /// The code never expires.
    Unlimited,
    /// The code expires on this UTC date.
    Until(NaiveDate),
}

impl DateComponent {
    /// Derives the date component from an optional expiry instant.
    #[must_use]
    pub fn from_expiry(expires_at: Option<DateTime<Utc>>) -> Self {
        match expires_at {
            None => Self::Unlimited,
            Some(at) => Self::Until(at.date_naive()),
        }
    }

    /// Parses `UNLIMITED` or an 8-digit `YYYYMMDD` date.
    pub fn parse(segment: &str) -> LicenseResult<Self> {
        if segment == UNLIMITED_MARKER {
            return Ok(Self::Unlimited);
        }
        if segment.len() != 8 || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LicenseError::InvalidDate(segment.to_string()));
        }
        NaiveDate::parse_from_str(segment, DATE_FORMAT)
            .map(Self::Until)
            .map_err(|e| LicenseError::InvalidDate(format!("{segment}: {e}")))
    }

    /// Instant after which an offline verifier treats the code as expired.
    ///
    /// Shipped clients read the date as the start of that day, so a code
    /// is accepted offline strictly before 00:00 UTC of its expiry date.
    #[must_use]
    pub fn offline_deadline(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Unlimited => None,
            Self::Until(date) => date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
        }
    }
}

impl fmt::Display for DateComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str(UNLIMITED_MARKER),
            Self::Until(date) => write!(f, "{}", date.format(DATE_FORMAT)),
        }
    }
}

/// Computes the 8-character signature for a date component.
#[must_use]
pub fn master_signature(date_component: &str, secret: &SharedSecret) -> String {
    let data = format!(
        "{MASTER_PREFIX}{CODE_DELIMITER}{date_component}{CODE_DELIMITER}{}",
        secret.expose()
    );
    let digest = Sha256::digest(data.as_bytes());
    let mut signature = hex::encode_upper(digest);
    signature.truncate(SEGMENT_LEN);
    signature
}

/// Normalizes user-entered code text: trims, drops spaces and line
/// breaks, uppercases.
#[must_use]
pub fn normalize_code(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\n' | '\r' | '\t'))
        .collect::<String>()
        .to_uppercase()
}

/// A parsed (not yet verified) Master code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterCode {
    /// The normalized code string.
    raw: String,
    /// Embedded expiry date.
    date: DateComponent,
    /// Embedded signature.
    signature: String,
    /// Embedded use type.
    use_type: UseType,
}

impl MasterCode {
    /// Assembles a Master code from its parts.
    #[must_use]
    pub fn assemble(
        date: DateComponent,
        secret: &SharedSecret,
        use_type: UseType,
        suffix: &str,
    ) -> Self {
        let date_str = date.to_string();
        let signature = master_signature(&date_str, secret);
        let raw = [MASTER_PREFIX, &date_str, &signature, use_type.tag(), suffix]
            .join(&CODE_DELIMITER.to_string());
        Self {
            raw,
            date,
            signature,
            use_type,
        }
    }

    /// Parses a Master code. Input is normalized first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCodeFormat` or `InvalidDate` if the code does not
    /// follow the Master grammar. The signature is not checked here.
    pub fn parse(code: &str) -> LicenseResult<Self> {
        let raw = normalize_code(code);
        let parts: Vec<&str> = raw.split(CODE_DELIMITER).collect();
        if parts.len() != 5 {
            return Err(LicenseError::InvalidCodeFormat(
                "master code must have exactly five segments".to_string(),
            ));
        }
        if parts[0] != MASTER_PREFIX {
            return Err(LicenseError::InvalidCodeFormat(format!(
                "master code must start with {MASTER_PREFIX}"
            )));
        }
        let date = DateComponent::parse(parts[1])?;

        let signature = parts[2];
        if !is_segment(signature) {
            return Err(LicenseError::InvalidCodeFormat(
                "signature must be 8 alphanumeric characters".to_string(),
            ));
        }
        let use_type = UseType::from_tag(parts[3]).ok_or_else(|| {
            LicenseError::InvalidCodeFormat(format!("unknown use type {:?}", parts[3]))
        })?;
        if !is_segment(parts[4]) {
            return Err(LicenseError::InvalidCodeFormat(
                "random suffix must be 8 alphanumeric characters".to_string(),
            ));
        }

        Ok(Self {
            signature: signature.to_string(),
            raw,
            date,
            use_type,
        })
    }

    /// Checks expiry and signature the way shipped clients do: expiry
    /// first, then signature.
    pub fn verify(&self, secret: &SharedSecret, now: DateTime<Utc>) -> LicenseResult<()> {
        if let Some(deadline) = self.date.offline_deadline()
            && now > deadline
        {
            return Err(LicenseError::Expired(self.date.to_string()));
        }
        if master_signature(&self.date.to_string(), secret) != self.signature {
            return Err(LicenseError::InvalidSignature);
        }
        Ok(())
    }

    /// Returns the normalized code string.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the embedded date component.
    #[must_use]
    pub fn date(&self) -> DateComponent {
        self.date
    }

    /// Returns the embedded signature.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Returns the embedded use type.
    #[must_use]
    pub fn use_type(&self) -> UseType {
        self.use_type
    }
}

/// Parses and verifies a Master code in one step.
pub fn verify_master_code(
    code: &str,
    secret: &SharedSecret,
    now: DateTime<Utc>,
) -> LicenseResult<MasterCode> {
    let parsed = MasterCode::parse(code)?;
    parsed.verify(secret, now)?;
    Ok(parsed)
}

pub(crate) fn is_segment(segment: &str) -> bool {
    segment.len() == SEGMENT_LEN
        && segment
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
