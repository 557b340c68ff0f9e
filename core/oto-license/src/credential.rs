//! The issued-credential record.

use crate::generator::Minted;
use crate::master::UseType;
use chrono::{DateTime, Utc};
use oto_types::ActorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two credential classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    /// Self-verifying, privileged to create.
    Master,
    /// Device-bound, open to create.
    Normal,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Master => f.write_str("MASTER"),
            Self::Normal => f.write_str("NORMAL"),
        }
    }
}

/// Kind-specific fields of a credential.
///
/// Single-use tracking only exists on Master credentials and the device
/// binding only on Normal ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CredentialDetail {
    /// Master credential state.
    Master {
        /// Whether the credential can be redeemed once only.
        single_use: bool,
        /// Whether a single-use credential has been redeemed.
        consumed: bool,
    },
    /// Normal credential state.
    Normal {
        /// Device id supplied at issuance.
        device_id: String,
    },
}

/// Why a credential cannot be marked consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeRefusal {
    /// The credential was already consumed.
    AlreadyConsumed,
    /// The credential is multi-use or a Normal credential.
    NotSingleUse,
}

/// An issued credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    code: String,
    owner: ActorId,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    detail: CredentialDetail,
}

impl Credential {
    /// Builds a Master credential record from a freshly minted code.
    #[must_use]
    pub fn master(minted: Minted, owner: ActorId, use_type: UseType) -> Self {
        Self {
            code: minted.code,
            owner,
            created_at: minted.issued_at,
            expires_at: minted.expires_at,
            detail: CredentialDetail::Master {
                single_use: use_type.is_single(),
                consumed: false,
            },
        }
    }

    /// Builds a Normal credential record from a freshly minted code.
    #[must_use]
    pub fn normal(minted: Minted, owner: ActorId, device_id: impl Into<String>) -> Self {
        Self {
            code: minted.code,
            owner,
            created_at: minted.issued_at,
            expires_at: minted.expires_at,
            detail: CredentialDetail::Normal {
                device_id: device_id.into(),
            },
        }
    }

    /// Returns the credential code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the class of this credential.
    #[must_use]
    pub fn kind(&self) -> CredentialKind {
        match self.detail {
            CredentialDetail::Master { .. } => CredentialKind::Master,
            CredentialDetail::Normal { .. } => CredentialKind::Normal,
        }
    }

    /// Returns the kind-specific fields.
    #[must_use]
    pub fn detail(&self) -> &CredentialDetail {
        &self.detail
    }

    /// Returns the actor who requested issuance.
    #[must_use]
    pub fn owner(&self) -> ActorId {
        self.owner
    }

    /// Returns the issuance instant.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the expiry instant, or None for unlimited Master credentials.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns true for single-use Master credentials.
    #[must_use]
    pub fn is_single_use(&self) -> bool {
        matches!(self.detail, CredentialDetail::Master { single_use: true, .. })
    }

    /// Returns true once a single-use Master credential has been redeemed.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        matches!(self.detail, CredentialDetail::Master { consumed: true, .. })
    }

    /// Returns the bound device id for Normal credentials.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        match &self.detail {
            CredentialDetail::Normal { device_id } => Some(device_id),
            CredentialDetail::Master { .. } => None,
        }
    }

    /// Returns true if the credential has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Returns true if the credential is usable at `now`.
    ///
    /// Master: not consumed (or multi-use) and not expired. Normal: not
    /// expired.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_consumed() && !self.is_expired_at(now)
    }

    /// Marks a single-use Master credential as consumed.
    ///
    /// Consumption is one-way; there is no operation that clears it.
    pub fn consume(&mut self) -> Result<(), ConsumeRefusal> {
        match &mut self.detail {
            CredentialDetail::Master {
                single_use: true,
                consumed,
            } => {
                if *consumed {
                    return Err(ConsumeRefusal::AlreadyConsumed);
                }
                *consumed = true;
                Ok(())
            }
            _ => Err(ConsumeRefusal::NotSingleUse),
        }
    }
}
