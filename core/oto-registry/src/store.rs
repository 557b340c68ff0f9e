//! Persistence seam for registry state.

use crate::actor::Actor;
use crate::error::RegistryResult;
use oto_license::Credential;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Full registry state as written to a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Credentials in issuance order.
    pub credentials: Vec<Credential>,
    /// Known actors.
    pub actors: Vec<Actor>,
}

impl RegistrySnapshot {
    /// Loads a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Backing store for a [`crate::CredentialRegistry`].
pub trait RegistryStore: Send + Sync {
    /// Loads the last saved state. A store with nothing saved yet returns
    /// an empty snapshot.
    fn load(&self) -> RegistryResult<RegistrySnapshot>;

    /// Replaces the saved state.
    fn save(&self, snapshot: &RegistrySnapshot) -> RegistryResult<()>;

    /// Whether `save` has any effect. The registry skips snapshotting
    /// for stores that return false.
    fn is_persistent(&self) -> bool {
        true
    }
}

/// Volatile store: state lives only as long as the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStore;

impl RegistryStore for MemoryStore {
    fn load(&self) -> RegistryResult<RegistrySnapshot> {
        Ok(RegistrySnapshot::default())
    }

    fn save(&self, _snapshot: &RegistrySnapshot) -> RegistryResult<()> {
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

/// Stores the registry as a pretty-printed JSON file.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store at `path`. Nothing is touched until the first
    /// `load` or `save`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the target file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RegistryStore for JsonFileStore {
    fn load(&self) -> RegistryResult<RegistrySnapshot> {
        if !self.path.exists() {
            debug!("No registry file at {:?}, starting empty", self.path);
            return Ok(RegistrySnapshot::default());
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(RegistrySnapshot::from_json(&json)?)
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> RegistryResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = snapshot.to_json()?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
