//! Error types for dispatching and presentation.

use oto_registry::RegistryError;
use oto_types::ActorId;
use thiserror::Error;

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors that can occur while handling an inbound event.
///
/// Every variant is rendered back to the actor; none is fatal.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The actor lacks the privilege the action requires.
    #[error("actor {actor} is not allowed to {action}")]
    Unauthorized {
        /// The rejected actor.
        actor: ActorId,
        /// What the actor tried to do.
        action: &'static str,
    },

    /// Unknown or out-of-range selection token.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Every generated code collided with an existing one.
    #[error("could not allocate a unique code after {attempts} attempts")]
    IssuanceExhausted {
        /// Number of codes tried.
        attempts: usize,
    },

    /// Registry failure (storage, consumption).
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors a [`crate::Presenter`] can report.
#[derive(Debug, Error)]
pub enum PresentError {
    /// The transport refused or dropped the message.
    #[error("transport error: {0}")]
    Transport(String),

    /// Local I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
