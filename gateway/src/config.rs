//! Gateway configuration: an optional TOML file overridden by CLI flags.
//!
//! ```toml
//! listen = "127.0.0.1:8080"
//! admin_ids = [123456789]
//! shared_secret = "..."
//! store_path = "/var/lib/oto/registry.json"
//! ```

use oto_dispatch::{AdminAllowList, DispatchConfig, Dispatcher};
use oto_license::{CredentialGenerator, SharedSecret};
use oto_registry::{CredentialRegistry, JsonFileStore, MemoryStore, RegistryResult, RegistryStore};
use oto_types::ActorId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Default HTTP listen address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

/// Errors loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Runtime settings for the gateway binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// HTTP listen address.
    pub listen: String,
    /// Actors allowed to create Master credentials and view stats.
    pub admin_ids: Vec<i64>,
    /// Master signature secret. Falls back to the secret shipped clients use.
    pub shared_secret: Option<String>,
    /// Registry file. In-memory only when unset.
    pub store_path: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            admin_ids: Vec::new(),
            shared_secret: None,
            store_path: None,
        }
    }
}

impl GatewayConfig {
    /// Parses a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Loads the config file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded gateway config from {:?}", path);
        Ok(config)
    }

    /// Returns the admin allow-list.
    pub fn policy(&self) -> AdminAllowList {
        AdminAllowList::new(self.admin_ids.iter().copied().map(ActorId::new))
    }

    /// Returns the configured secret or the shipped default.
    pub fn secret(&self) -> SharedSecret {
        match &self.shared_secret {
            Some(secret) => SharedSecret::new(secret.clone()),
            None => SharedSecret::default(),
        }
    }

    /// Opens the registry, restoring state from `store_path` if set.
    pub fn open_registry(&self) -> RegistryResult<CredentialRegistry> {
        let store: Arc<dyn RegistryStore> = match &self.store_path {
            Some(path) => {
                info!("Using registry file {:?}", path);
                Arc::new(JsonFileStore::new(path))
            }
            None => {
                warn!("No store_path configured; issued credentials are lost on exit");
                Arc::new(MemoryStore)
            }
        };
        CredentialRegistry::open(store)
    }

    /// Builds a dispatcher on the system clock and thread RNG.
    pub fn build_dispatcher(&self) -> RegistryResult<Dispatcher> {
        let registry = Arc::new(self.open_registry()?);
        if self.admin_ids.is_empty() {
            warn!("No admin_ids configured; Master credentials cannot be created");
        }
        Ok(Dispatcher::new(
            CredentialGenerator::system(self.secret()),
            registry,
            Arc::new(self.policy()),
            DispatchConfig::default(),
        ))
    }
}
