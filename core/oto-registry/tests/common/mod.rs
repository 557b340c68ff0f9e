//! Shared test helpers for registry tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use oto_license::{Credential, CredentialGenerator, Days, SharedSecret, UseType};
use oto_registry::{RegistryError, RegistryResult, RegistrySnapshot, RegistryStore};
use oto_types::{ActorId, FixedClock, ScriptedRandom};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 2026-10-19 09:30:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
}

fn generator(segments: &[&str]) -> CredentialGenerator {
    CredentialGenerator::new(
        SharedSecret::default(),
        Arc::new(FixedClock::new(fixed_now())),
        Arc::new(ScriptedRandom::new(segments.iter().copied())),
    )
}

/// A Master credential with a fixed random suffix.
pub fn master(owner: i64, days: Option<u32>, use_type: UseType, suffix: &str) -> Credential {
    let minted = generator(&[suffix]).generate_master(days.map(|d| Days::new(d).unwrap()), use_type);
    Credential::master(minted, ActorId::new(owner), use_type)
}

/// A Normal credential with fixed random segments.
pub fn normal(owner: i64, device_id: &str, days: u32, a: &str, b: &str) -> Credential {
    let minted = generator(&[a, b]).generate_normal(device_id, Days::new(days).unwrap());
    Credential::normal(minted, ActorId::new(owner), device_id)
}

/// Store that keeps the last saved snapshot and can be told to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub saved: std::sync::Mutex<Option<RegistrySnapshot>>,
    pub fail: AtomicBool,
    pub saves: AtomicUsize,
}

impl FlakyStore {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
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
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.saved.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }
}
