//! Shared test helpers for dispatch tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use oto_dispatch::{AdminAllowList, DispatchConfig, Dispatcher, Inbound, Outbound};
use oto_license::{CredentialGenerator, SharedSecret};
use oto_registry::{CredentialRegistry, RegistryError, RegistryResult, RegistrySnapshot, RegistryStore};
use oto_types::{ActorId, FixedClock, RandomSource, ScriptedRandom, ThreadRandom};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const ADMIN: ActorId = ActorId::new(1001);
pub const USER: ActorId = ActorId::new(2002);

/// 2026-10-19 09:30:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
}

pub struct Harness {
    pub dispatcher: Dispatcher,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn send(&self, inbound: Inbound) -> Vec<Outbound> {
        self.dispatcher.handle(inbound)
    }

    pub fn command(&self, actor: ActorId, name: &str) -> Vec<Outbound> {
        self.send(Inbound::command(actor, "tester", name))
    }

    pub fn select(&self, actor: ActorId, token: &str) -> Vec<Outbound> {
        self.send(Inbound::selection(actor, token))
    }

    pub fn text(&self, actor: ActorId, text: &str) -> Vec<Outbound> {
        self.send(Inbound::text(actor, text))
    }

    pub fn registry(&self) -> &Arc<CredentialRegistry> {
        self.dispatcher.registry()
    }
}

pub fn harness_with(
    registry: Arc<CredentialRegistry>,
    random: Arc<dyn RandomSource>,
    config: DispatchConfig,
) -> Harness {
    let clock = Arc::new(FixedClock::new(fixed_now()));
    let generator = CredentialGenerator::new(SharedSecret::default(), clock.clone(), random);
    let policy = Arc::new(AdminAllowList::new([ADMIN]));
    Harness {
        dispatcher: Dispatcher::new(generator, registry, policy, config),
        clock,
    }
}

/// Dispatcher with ADMIN privileged, a pinned clock and real randomness.
pub fn harness() -> Harness {
    harness_with(
        Arc::new(CredentialRegistry::new()),
        Arc::new(ThreadRandom),
        DispatchConfig::default(),
    )
}

/// Dispatcher whose random segments replay `segments`.
pub fn scripted_harness(segments: &[&str], config: DispatchConfig) -> Harness {
    harness_with(
        Arc::new(CredentialRegistry::new()),
        Arc::new(ScriptedRandom::new(segments.iter().copied())),
        config,
    )
}

/// Returns the text of the only reply.
pub fn only_text(replies: &[Outbound]) -> &str {
    assert_eq!(replies.len(), 1, "expected one reply, got {replies:?}");
    replies[0].text()
}

/// Store that can be switched to fail every save.
#[derive(Default)]
pub struct FlakyStore {
    saved: Mutex<Option<RegistrySnapshot>>,
    fail: AtomicBool,
}

impl FlakyStore {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl RegistryStore for FlakyStore {
    fn load(&self) -> RegistryResult<RegistrySnapshot> {
        Ok(self.saved.lock().unwrap().clone().unwrap_or_default())
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> RegistryResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RegistryError::Storage("disk full".to_string()));
        }
        *self.saved.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }
}
