//! The credential registry.

use crate::actor::Actor;
use crate::error::{RegistryError, RegistryResult};
use crate::store::{MemoryStore, RegistrySnapshot, RegistryStore};
use chrono::{DateTime, Utc};
use oto_license::{ConsumeRefusal, Credential, CredentialKind};
use oto_types::ActorId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Credential counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    /// Master credentials issued.
    pub master: usize,
    /// Normal credentials issued.
    pub normal: usize,
}

/// Aggregate counts for privileged reporting. Never contains codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Actors that have contacted the engine.
    pub total_users: usize,
    /// Credentials issued.
    pub total_credentials: usize,
    /// Credentials issued, split by kind.
    pub by_kind: KindCounts,
    /// Single-use Master credentials already consumed.
    pub consumed_single_use: usize,
}

#[derive(Debug, Clone, Default)]
struct RegistryState {
    /// Credentials in issuance order.
    credentials: Vec<Credential>,
    /// Code -> position in `credentials`.
    index: HashMap<String, usize>,
    actors: BTreeMap<ActorId, Actor>,
}

impl RegistryState {
    fn from_snapshot(snapshot: RegistrySnapshot) -> RegistryResult<Self> {
        let mut state = Self::default();
        for credential in snapshot.credentials {
            state.insert(credential).map_err(|e| {
                RegistryError::Storage(format!("stored registry is inconsistent: {e}"))
            })?;
        }
        for actor in snapshot.actors {
            state.actors.insert(actor.id, actor);
        }
        Ok(state)
    }

    fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            credentials: self.credentials.clone(),
            actors: self.actors.values().cloned().collect(),
        }
    }

    fn insert(&mut self, credential: Credential) -> RegistryResult<()> {
        if self.index.contains_key(credential.code()) {
            return Err(RegistryError::DuplicateCode(credential.code().to_string()));
        }
        self.index
            .insert(credential.code().to_string(), self.credentials.len());
        self.credentials.push(credential);
        Ok(())
    }

    fn get(&self, code: &str) -> Option<&Credential> {
        self.index.get(code).map(|&i| &self.credentials[i])
    }

    fn get_mut(&mut self, code: &str) -> Option<&mut Credential> {
        let i = *self.index.get(code)?;
        self.credentials.get_mut(i)
    }
}

/// In-memory registry of issued credentials and known actors.
///
/// All methods take `&self`; state is guarded by one mutex so the
/// uniqueness check and insert in [`CredentialRegistry::issue`] are atomic
/// across concurrent callers.
pub struct CredentialRegistry {
    state: Mutex<RegistryState>,
    store: Arc<dyn RegistryStore>,
}

impl CredentialRegistry {
    /// Creates an empty, volatile registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            store: Arc::new(MemoryStore),
        }
    }

    /// Opens a registry backed by `store`, restoring its saved state.
    pub fn open(store: Arc<dyn RegistryStore>) -> RegistryResult<Self> {
        let snapshot = store.load()?;
        let state = RegistryState::from_snapshot(snapshot)?;
        info!(
            "Registry opened with {} credentials and {} actors",
            state.credentials.len(),
            state.actors.len()
        );
        Ok(Self {
            state: Mutex::new(state),
            store,
        })
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `mutate` and writes the result through the store.
    ///
    /// For persistent stores the mutation runs on a copy that only replaces
    /// the live state once the save succeeded.
    fn commit<T>(
        &self,
        state: &mut RegistryState,
        mutate: impl FnOnce(&mut RegistryState) -> RegistryResult<T>,
    ) -> RegistryResult<T> {
        if !self.store.is_persistent() {
            return mutate(state);
        }
        let mut next = state.clone();
        let out = mutate(&mut next)?;
        if let Err(e) = self.store.save(&next.snapshot()) {
            warn!("Registry save failed, change discarded: {}", e);
            return Err(e);
        }
        *state = next;
        Ok(out)
    }

    // ── Credentials ──────────────────────────────────────────────

    /// Inserts a newly issued credential.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if a credential with the same code exists.
    /// Callers are expected to regenerate and retry.
    pub fn issue(&self, credential: Credential) -> RegistryResult<()> {
        let mut state = self.lock();
        let code = credential.code().to_string();
        let kind = credential.kind();
        let owner = credential.owner();
        self.commit(&mut state, |s| s.insert(credential))?;
        info!("Issued {} credential {} for actor {}", kind, code, owner);
        Ok(())
    }

    /// Returns a copy of the credential with this code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<Credential> {
        self.lock().get(code).cloned()
    }

    /// Returns the owner's credentials in issuance order.
    #[must_use]
    pub fn list_by_owner(&self, owner: ActorId) -> Vec<Credential> {
        self.lock()
            .credentials
            .iter()
            .filter(|c| c.owner() == owner)
            .cloned()
            .collect()
    }

    /// Marks a single-use Master credential as consumed.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no credential has this code.
    /// - `AlreadyConsumed` if it was consumed before.
    /// - `NotSingleUse` for multi-use Master and all Normal credentials.
    pub fn mark_consumed(&self, code: &str) -> RegistryResult<()> {
        let mut state = self.lock();
        self.commit(&mut state, |s| {
            let credential = s
                .get_mut(code)
                .ok_or_else(|| RegistryError::NotFound(code.to_string()))?;
            credential.consume().map_err(|refusal| match refusal {
                ConsumeRefusal::AlreadyConsumed => RegistryError::AlreadyConsumed(code.to_string()),
                ConsumeRefusal::NotSingleUse => RegistryError::NotSingleUse(code.to_string()),
            })
        })?;
        info!("Consumed credential {}", code);
        Ok(())
    }

    /// Returns true if the credential exists and is usable at `now`.
    #[must_use]
    pub fn is_valid(&self, code: &str, now: DateTime<Utc>) -> bool {
        self.lock()
            .get(code)
            .is_some_and(|c| c.is_valid_at(now))
    }

    /// Returns the number of issued credentials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().credentials.len()
    }

    /// Returns true if nothing has been issued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns aggregate counts.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let state = self.lock();
        let mut stats = RegistryStats {
            total_users: state.actors.len(),
            total_credentials: state.credentials.len(),
            ..Default::default()
        };
        for credential in &state.credentials {
            match credential.kind() {
                CredentialKind::Master => stats.by_kind.master += 1,
                CredentialKind::Normal => stats.by_kind.normal += 1,
            }
            if credential.is_consumed() {
                stats.consumed_single_use += 1;
            }
        }
        stats
    }

    // ── Actors ───────────────────────────────────────────────────

    /// Records contact from an actor.
    ///
    /// The first contact creates the record. Later contacts refresh the
    /// display name but keep the first-seen time.
    pub fn register_actor(
        &self,
        id: ActorId,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> RegistryResult<Actor> {
        let mut state = self.lock();
        if let Some(existing) = state.actors.get(&id)
            && existing.display_name == display_name
        {
            return Ok(existing.clone());
        }
        self.commit(&mut state, |s| {
            let actor = s
                .actors
                .entry(id)
                .and_modify(|a| a.display_name = display_name.to_string())
                .or_insert_with(|| {
                    debug!("First contact from actor {}", id);
                    Actor::new(id, display_name, now)
                });
            Ok(actor.clone())
        })
    }

    /// Returns the actor record, if the actor has been seen.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<Actor> {
        self.lock().actors.get(&id).cloned()
    }
}

impl Default for CredentialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CredentialRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("CredentialRegistry")
            .field("credentials", &state.credentials.len())
            .field("actors", &state.actors.len())
            .field("persistent", &self.store.is_persistent())
            .finish()
    }
}
