//! Credential registry for the OtoService license engine.
//!
//! The registry is the single owner of every issued credential and every
//! known actor. It is the authority on:
//! - Code uniqueness (check and insert happen under one lock)
//! - Ownership (listing is always scoped to one owner)
//! - Consumption of single-use Master credentials
//!
//! State lives in memory. A [`RegistryStore`] can be plugged in to make it
//! durable; every mutation is written through before it becomes visible.

mod actor;
mod error;
mod registry;
mod store;

pub use actor::Actor;
pub use error::{RegistryError, RegistryResult};
pub use registry::{CredentialRegistry, KindCounts, RegistryStats};
pub use store::{JsonFileStore, MemoryStore, RegistrySnapshot, RegistryStore};
