//! Bounded day counts for credential lifetimes.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest lifetime a timed Master credential may have.
pub const MASTER_MAX_DAYS: u32 = 3650;

/// Longest lifetime a Normal credential may have.
pub const NORMAL_MAX_DAYS: u32 = 365;

/// A number of days in `1..=MASTER_MAX_DAYS`.
///
/// No credential outlives the longest Master duration, so every `Days`
/// added to a realistic issuance time stays within chrono's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Days(u32);

impl Days {
    /// Creates a day count within `1..=MASTER_MAX_DAYS`.
    pub fn new(days: u32) -> LicenseResult<Self> {
        Self::bounded(days, MASTER_MAX_DAYS)
    }

    /// Creates a day count within `1..=max`. `max` is capped at
    /// [`MASTER_MAX_DAYS`].
    pub fn bounded(days: u32, max: u32) -> LicenseResult<Self> {
        let max = max.min(MASTER_MAX_DAYS);
        if days == 0 || days > max {
            return Err(LicenseError::InvalidDuration {
                input: days.to_string(),
                max,
            });
        }
        Ok(Self(days))
    }

    /// Parses free text as a day count within `1..=max`.
    ///
    /// `max` is capped at [`MASTER_MAX_DAYS`]. Surrounding whitespace is
    /// ignored. Signs, fractions and anything
    /// that does not fit in an integer are rejected.
    pub fn parse_bounded(input: &str, max: u32) -> LicenseResult<Self> {
        let max = max.min(MASTER_MAX_DAYS);
        let invalid = || LicenseError::InvalidDuration {
            input: input.trim().to_string(),
            max,
        };
        let value: i64 = input.trim().parse().map_err(|_| invalid())?;
        if value < 1 || value > i64::from(max) {
            return Err(invalid());
        }
        u32::try_from(value).map(Self).map_err(|_| invalid())
    }

    /// Returns the raw number of days.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the span as a chrono duration.
    #[must_use]
    pub fn as_duration(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.0))
    }
}

impl TryFrom<u32> for Days {
    type Error = LicenseError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<Days> for u32 {
    fn from(days: Days) -> Self {
        days.0
    }
}

impl fmt::Display for Days {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
