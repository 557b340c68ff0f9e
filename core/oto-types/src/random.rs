//! Random alphanumeric segments for credential codes.
//!
//! The randomness here only reduces accidental collisions between codes.
//! It is not a security property.

use rand::Rng;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Characters a random code segment is drawn from (`[A-Z0-9]`).
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Supplies random `[A-Z0-9]` strings.
pub trait RandomSource: Send + Sync {
    /// Returns a string of `len` characters drawn from [`CODE_ALPHABET`].
    fn alphanumeric(&self, len: usize) -> String;
}

/// Thread-local RNG backed source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn alphanumeric(&self, len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len)
            .map(|_| {
                let idx = rng.gen_range(0..CODE_ALPHABET.len());
                char::from(CODE_ALPHABET[idx])
            })
            .collect()
    }
}

/// Replays a fixed script of segments, then falls back to a repeated
/// filler character.
///
/// Segments are returned as-is when their length matches the request and
/// are padded or cut to `len` otherwise.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    script: Mutex<VecDeque<String>>,
}

impl ScriptedRandom {
    /// Creates a source that yields `segments` in order.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(segments.into_iter().map(Into::into).collect()),
        }
    }

    /// Appends more segments to the script.
    pub fn push(&self, segment: impl Into<String>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(segment.into());
    }

    /// Number of scripted segments not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl RandomSource for ScriptedRandom {
    fn alphanumeric(&self, len: usize) -> String {
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let mut segment: String = next.unwrap_or_default().chars().take(len).collect();
        while segment.len() < len {
            segment.push('0');
        }
        segment
    }
}
