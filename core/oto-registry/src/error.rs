//! Error types for the registry.

use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur in registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A credential with this code is already registered.
    #[error("duplicate credential code: {0}")]
    DuplicateCode(String),

    /// No credential with this code exists.
    #[error("credential not found: {0}")]
    NotFound(String),

    /// The single-use credential was already consumed.
    #[error("credential already consumed: {0}")]
    AlreadyConsumed(String),

    /// The credential is not a single-use Master credential.
    #[error("credential is not single-use: {0}")]
    NotSingleUse(String),

    /// Stored state is inconsistent.
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error in a durable store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
