//! Core type definitions for the OtoService license engine.
//!
//! This crate defines the leaf types every other crate builds on:
//! - Actor and event identifiers
//! - The `Clock` seam (wall time for issuance and expiry)
//! - The `RandomSource` seam (alphanumeric segments for credential codes)
//!
//! Both seams have a production implementation and a deterministic one
//! for tests.

mod clock;
mod ids;
mod random;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ids::{ActorId, EventId};
pub use random::{RandomSource, ScriptedRandom, ThreadRandom, CODE_ALPHABET};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid actor id: {0}")]
    InvalidActorId(String),
}
