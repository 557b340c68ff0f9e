//! Per-actor multi-step input.
//!
//! An actor with no entry in the [`SessionTable`] is idle. Starting a flow
//! that needs free text stores a [`PendingInteraction`]; the next text
//! message from that actor is checked against it with
//! [`PendingInteraction::accept`]. Starting any other flow overwrites or
//! clears the entry, so there is no explicit cancel.

use oto_license::Days;
use oto_types::ActorId;
use std::collections::HashMap;
use thiserror::Error;

/// What the engine is waiting for from an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInteraction {
    /// A day count for a custom-length Master credential.
    AwaitingCustomDuration,
    /// A device id and a day count for a Normal credential, one per line.
    AwaitingDeviceAndDuration,
}

/// Free text accepted by a pending interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accepted {
    /// Custom Master duration; the use type is asked next.
    CustomDuration(Days),
    /// Everything needed to issue a Normal credential.
    NormalRequest {
        /// First line of the input, trimmed.
        device_id: String,
        /// Second line of the input.
        days: Days,
    },
}

/// Free text rejected by a pending interaction. The interaction stays
/// pending and the actor is prompted again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Not a whole number within `1..=max`.
    #[error("invalid duration, enter a number of days between 1 and {max}")]
    InvalidDuration {
        /// Inclusive upper bound.
        max: u32,
    },

    /// Fewer than two lines.
    #[error("missing information, send two lines: the device id, then the number of days")]
    MissingLines,
}

impl PendingInteraction {
    /// Checks `text` against this interaction.
    ///
    /// `master_max` bounds custom Master durations and `normal_max` bounds
    /// Normal durations.
    pub fn accept(&self, text: &str, master_max: u32, normal_max: u32) -> Result<Accepted, InputError> {
        match self {
            Self::AwaitingCustomDuration => Days::parse_bounded(text, master_max)
                .map(Accepted::CustomDuration)
                .map_err(|_| InputError::InvalidDuration { max: master_max }),
            Self::AwaitingDeviceAndDuration => {
                // Leading blank lines are trimmed away, so the first line
                // always holds a non-empty device id.
                let mut lines = text.trim().lines();
                let (Some(device), Some(days)) = (lines.next(), lines.next()) else {
                    return Err(InputError::MissingLines);
                };
                let device_id = device.trim();
                let days = Days::parse_bounded(days, normal_max)
                    .map_err(|_| InputError::InvalidDuration { max: normal_max })?;
                Ok(Accepted::NormalRequest {
                    device_id: device_id.to_string(),
                    days,
                })
            }
        }
    }
}

/// Pending interactions keyed by actor. Lives for the process only.
#[derive(Debug, Default)]
pub struct SessionTable {
    pending: HashMap<ActorId, PendingInteraction>,
}

impl SessionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the actor's pending interaction, if any.
    #[must_use]
    pub fn get(&self, actor: ActorId) -> Option<PendingInteraction> {
        self.pending.get(&actor).copied()
    }

    /// Replaces the actor's pending interaction. Returns the one it replaced.
    pub fn set(&mut self, actor: ActorId, pending: PendingInteraction) -> Option<PendingInteraction> {
        self.pending.insert(actor, pending)
    }

    /// Returns the actor to idle.
    pub fn clear(&mut self, actor: ActorId) -> Option<PendingInteraction> {
        self.pending.remove(&actor)
    }

    /// Number of actors with a pending interaction.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if every actor is idle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
