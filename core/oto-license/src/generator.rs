//! Credential code generation.
//!
//! Generation reads the clock once per code and draws random segments
//! independently of any registry, so two calls can in principle produce
//! the same code. Uniqueness is enforced by the registry at insert time.

use crate::device::NormalCode;
use crate::duration::Days;
use crate::master::{DateComponent, MasterCode, SharedSecret, UseType};
use crate::SEGMENT_LEN;
use chrono::{DateTime, Utc};
use oto_types::{Clock, RandomSource, SystemClock, ThreadRandom};
use std::sync::Arc;

/// A freshly generated code and its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minted {
    /// The credential code.
    pub code: String,
    /// The instant the code was generated.
    pub issued_at: DateTime<Utc>,
    /// `issued_at` plus the requested days, or None for unlimited codes.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Produces Master and Normal credential codes.
#[derive(Clone)]
pub struct CredentialGenerator {
    secret: SharedSecret,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl CredentialGenerator {
    /// Creates a generator with explicit time and randomness sources.
    pub fn new(secret: SharedSecret, clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            secret,
            clock,
            random,
        }
    }

    /// Creates a generator on the system clock and thread RNG.
    #[must_use]
    pub fn system(secret: SharedSecret) -> Self {
        Self::new(secret, Arc::new(SystemClock), Arc::new(ThreadRandom))
    }

    /// Returns the shared secret used for Master signatures.
    #[must_use]
    pub fn secret(&self) -> &SharedSecret {
        &self.secret
    }

    /// Returns the generator's clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Generates a Master code.
    ///
    /// `duration = None` produces an unlimited code with the `UNLIMITED`
    /// date component and no expiry.
    #[must_use]
    pub fn generate_master(&self, duration: Option<Days>, use_type: UseType) -> Minted {
        let issued_at = self.clock.now();
        let expires_at = duration.map(|days| issued_at + days.as_duration());
        let suffix = self.random.alphanumeric(SEGMENT_LEN);
        let code = MasterCode::assemble(
            DateComponent::from_expiry(expires_at),
            &self.secret,
            use_type,
            &suffix,
        );
        Minted {
            code: code.raw().to_string(),
            issued_at,
            expires_at,
        }
    }

    /// Generates a Normal code bound to `device_id`.
    #[must_use]
    pub fn generate_normal(&self, device_id: &str, days: Days) -> Minted {
        let issued_at = self.clock.now();
        let suffix_a = self.random.alphanumeric(SEGMENT_LEN);
        let suffix_b = self.random.alphanumeric(SEGMENT_LEN);
        let code = NormalCode::assemble(device_id, &suffix_a, &suffix_b);
        Minted {
            code: code.raw().to_string(),
            issued_at,
            expires_at: Some(issued_at + days.as_duration()),
        }
    }
}

impl std::fmt::Debug for CredentialGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialGenerator")
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}
