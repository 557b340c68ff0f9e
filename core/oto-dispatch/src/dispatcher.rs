//! The request dispatcher.

use crate::error::{DispatchError, DispatchResult};
use crate::policy::RolePolicy;
use crate::protocol::{Action, Inbound, Outbound};
use crate::render;
use crate::session::{Accepted, PendingInteraction, SessionTable};
use oto_license::{
    Credential, CredentialGenerator, Days, UseType, MASTER_MAX_DAYS, NORMAL_MAX_DAYS,
};
use oto_registry::{CredentialRegistry, RegistryError};
use oto_types::ActorId;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Codes generated per issuance before giving up on collisions.
pub const MAX_ISSUE_ATTEMPTS: usize = 8;

/// Dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Fixed Master durations offered in the duration menu.
    pub master_presets: Vec<Days>,
    /// Upper bound for Master durations, custom or tokenized.
    pub master_max_days: u32,
    /// Upper bound for Normal durations.
    pub normal_max_days: u32,
    /// Collision retries per issuance.
    pub max_issue_attempts: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            master_presets: [30, 90, 180, 365]
                .into_iter()
                .filter_map(|d| Days::new(d).ok())
                .collect(),
            master_max_days: MASTER_MAX_DAYS,
            normal_max_days: NORMAL_MAX_DAYS,
            max_issue_attempts: MAX_ISSUE_ATTEMPTS,
        }
    }
}

/// Routes inbound events to flows and produces replies.
///
/// Events are handled one at a time: the session table lock is held for
/// the whole event, so two events from one actor never interleave.
pub struct Dispatcher {
    generator: CredentialGenerator,
    registry: Arc<CredentialRegistry>,
    policy: Arc<dyn RolePolicy>,
    sessions: Mutex<SessionTable>,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Creates a dispatcher over an existing registry.
    pub fn new(
        generator: CredentialGenerator,
        registry: Arc<CredentialRegistry>,
        policy: Arc<dyn RolePolicy>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            generator,
            registry,
            policy,
            sessions: Mutex::new(SessionTable::new()),
            config,
        }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<CredentialRegistry> {
        &self.registry
    }

    /// Returns the code generator.
    #[must_use]
    pub fn generator(&self) -> &CredentialGenerator {
        &self.generator
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Returns the actor's pending interaction, if any.
    #[must_use]
    pub fn pending(&self, actor: ActorId) -> Option<PendingInteraction> {
        self.lock_sessions().get(actor)
    }

    fn lock_sessions(&self) -> MutexGuard<'_, SessionTable> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handles one inbound event and returns the replies to render.
    ///
    /// Errors are rendered as replies; this never fails.
    pub fn handle(&self, inbound: Inbound) -> Vec<Outbound> {
        let actor = inbound.actor();
        let mut sessions = self.lock_sessions();
        match self.route(&mut sessions, inbound) {
            Ok(replies) => replies,
            Err(e) => {
                match &e {
                    DispatchError::Unauthorized { action, .. } => {
                        warn!("Rejected actor {}: not allowed to {}", actor, action);
                    }
                    DispatchError::Validation(reason) => {
                        debug!("Invalid request from actor {}: {}", actor, reason);
                    }
                    _ => warn!("Request from actor {} failed: {}", actor, e),
                }
                vec![render::error(actor, &e)]
            }
        }
    }

    fn route(&self, sessions: &mut SessionTable, inbound: Inbound) -> DispatchResult<Vec<Outbound>> {
        match inbound {
            Inbound::Command {
                actor,
                display_name,
                name,
                ..
            } => {
                let action = Action::from_command(&name);
                if let Some(action) = action {
                    self.authorize(actor, action)?;
                }
                self.registry
                    .register_actor(actor, &display_name, self.generator.clock().now())?;
                match action {
                    Some(action) => self.select(sessions, actor, action),
                    None => Ok(vec![render::unknown_command(actor, &name)]),
                }
            }
            Inbound::Selection { actor, token } => {
                let action = Action::parse(&token, self.config.master_max_days)?;
                self.authorize(actor, action)?;
                self.touch_actor(actor)?;
                self.select(sessions, actor, action)
            }
            Inbound::FreeText { actor, text } => {
                self.touch_actor(actor)?;
                self.free_text(sessions, actor, &text)
            }
        }
    }

    /// Records first contact for actors that never sent a command.
    fn touch_actor(&self, actor: ActorId) -> DispatchResult<()> {
        if self.registry.actor(actor).is_none() {
            self.registry
                .register_actor(actor, "", self.generator.clock().now())?;
        }
        Ok(())
    }

    /// Runs before anything is written for the event, registry included.
    fn authorize(&self, actor: ActorId, action: Action) -> DispatchResult<()> {
        if action.requires_privilege() && !self.policy.is_privileged(actor) {
            return Err(DispatchError::Unauthorized {
                actor,
                action: action.privilege_description(),
            });
        }
        Ok(())
    }

    fn select(&self, sessions: &mut SessionTable, actor: ActorId, action: Action) -> DispatchResult<Vec<Outbound>> {
        self.authorize(actor, action)?;

        // Any new flow replaces whatever was pending.
        if let Some(previous) = sessions.clear(actor) {
            debug!("Actor {} left {:?} for {}", actor, previous, action);
        }

        let reply = match action {
            Action::BackToMain => {
                let name = self
                    .registry
                    .actor(actor)
                    .map(|a| a.display_name)
                    .unwrap_or_default();
                render::main_menu(actor, &name, self.policy.is_privileged(actor))
            }
            Action::CreateMaster => render::master_duration_menu(actor, &self.config.master_presets),
            Action::MasterDuration(days) => render::use_type_menu(actor, days),
            Action::MasterCustom => {
                sessions.set(actor, PendingInteraction::AwaitingCustomDuration);
                debug!("Actor {} awaiting custom duration", actor);
                render::custom_duration_prompt(actor, self.config.master_max_days)
            }
            Action::IssueMaster { days, use_type } => {
                let credential = self.issue_master(actor, days, use_type)?;
                render::issued(actor, &credential)
            }
            Action::GetNormal => {
                sessions.set(actor, PendingInteraction::AwaitingDeviceAndDuration);
                debug!("Actor {} awaiting device and duration", actor);
                render::normal_prompt(actor, self.config.normal_max_days)
            }
            Action::MyLicenses => {
                let now = self.generator.clock().now();
                render::listing(actor, &self.registry.list_by_owner(actor), now)
            }
            Action::Help => render::help(actor),
            Action::Admin => render::admin_panel(actor, &self.registry.stats()),
        };
        Ok(vec![reply])
    }

    fn free_text(&self, sessions: &mut SessionTable, actor: ActorId, text: &str) -> DispatchResult<Vec<Outbound>> {
        let Some(pending) = sessions.get(actor) else {
            return Ok(vec![render::idle_hint(actor)]);
        };

        let accepted = match pending.accept(text, self.config.master_max_days, self.config.normal_max_days) {
            Ok(accepted) => accepted,
            Err(e) => {
                debug!("Actor {} sent unusable input for {:?}: {}", actor, pending, e);
                return Ok(vec![render::input_error(actor, &e)]);
            }
        };

        let reply = match accepted {
            Accepted::CustomDuration(days) => {
                self.authorize(actor, Action::MasterCustom)?;
                sessions.clear(actor);
                render::custom_duration_accepted(actor, days)
            }
            Accepted::NormalRequest { device_id, days } => {
                let credential = self.issue_normal(actor, &device_id, days)?;
                sessions.clear(actor);
                render::issued(actor, &credential)
            }
        };
        Ok(vec![reply])
    }

    // ── Issuance ─────────────────────────────────────────────────

    fn issue_master(&self, actor: ActorId, days: Option<Days>, use_type: UseType) -> DispatchResult<Credential> {
        self.issue_with_retry(|| {
            let minted = self.generator.generate_master(days, use_type);
            Credential::master(minted, actor, use_type)
        })
    }

    fn issue_normal(&self, actor: ActorId, device_id: &str, days: Days) -> DispatchResult<Credential> {
        self.issue_with_retry(|| {
            let minted = self.generator.generate_normal(device_id, days);
            Credential::normal(minted, actor, device_id)
        })
    }

    /// Generates and inserts until the registry accepts a code.
    fn issue_with_retry(&self, mint: impl Fn() -> Credential) -> DispatchResult<Credential> {
        let attempts = self.config.max_issue_attempts.max(1);
        for attempt in 1..=attempts {
            let credential = mint();
            match self.registry.issue(credential.clone()) {
                Ok(()) => return Ok(credential),
                Err(RegistryError::DuplicateCode(_)) => {
                    debug!("Code collision on attempt {}/{}", attempt, attempts);
                }
                Err(e) => return Err(e.into()),
            }
        }
        warn!("Gave up issuing after {} colliding codes", attempts);
        Err(DispatchError::IssuanceExhausted { attempts })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
