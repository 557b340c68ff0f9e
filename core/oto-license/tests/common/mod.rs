//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use oto_license::{CredentialGenerator, SharedSecret};
use oto_types::{FixedClock, ScriptedRandom, ThreadRandom};
use std::sync::Arc;

/// 2026-10-19 09:30:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
}

/// Generator on a pinned clock with real randomness.
pub fn generator_at(now: DateTime<Utc>) -> (CredentialGenerator, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(now));
    let generator = CredentialGenerator::new(SharedSecret::default(), clock.clone(), Arc::new(ThreadRandom));
    (generator, clock)
}

/// Generator on a pinned clock replaying `segments` as random draws.
pub fn scripted_generator(now: DateTime<Utc>, segments: &[&str]) -> CredentialGenerator {
    CredentialGenerator::new(
        SharedSecret::default(),
        Arc::new(FixedClock::new(now)),
        Arc::new(ScriptedRandom::new(segments.iter().copied())),
    )
}

/// Returns true if `s` is exactly 8 characters of `[A-Z0-9]`.
pub fn is_segment(s: &str) -> bool {
    s.len() == 8 && s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
