//! The randomness service boundary.
//!
//! Dice values come from an injected [`RandomSource`] so that a remote
//! service, a local generator, or a scripted test double can all drive the
//! same engine. The engine never fails because of this dependency: any error
//! or malformed response degrades to an internal local roll, and every
//! [`DiceRoll`] carries a provenance tag so the caller can disclose the
//! degradation.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Where a roll's values actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollSource {
    /// The injected randomness service answered
    External,
    /// The service failed or misbehaved; the engine rolled locally
    Local,
}

/// The outcome of rolling two dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub die1: u8,
    pub die2: u8,
    pub total: u8,
    pub source: RollSource,
}

/// Failures a randomness service may report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RandomSourceError {
    #[error("randomness service unavailable: {0}")]
    Unavailable(String),
    #[error("malformed dice response: {die1}, {die2}")]
    MalformedRoll { die1: u8, die2: u8 },
}

/// Capability interface for everything random the engine needs during play.
pub trait RandomSource {
    /// Two die values, each in 1..=6. Errors make the engine fall back to a
    /// local roll; they never surface to the engine's caller.
    fn roll_dice(&mut self) -> Result<(u8, u8), RandomSourceError>;

    /// A uniform index in `0..bound` (`bound` >= 1). Used for weighted card
    /// theft, so that robbery randomness is substitutable too.
    fn pick(&mut self, bound: usize) -> usize;
}

/// Always-available local source backed by a ChaCha8 stream.
pub struct LocalRandom {
    rng: ChaCha8Rng,
}

impl LocalRandom {
    /// Entropy-seeded source for real play
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Deterministic source for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Roll a pair of dice. Infallible, unlike the trait method.
    pub fn roll_pair(&mut self) -> (u8, u8) {
        (self.rng.gen_range(1..=6), self.rng.gen_range(1..=6))
    }
}

impl Default for LocalRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for LocalRandom {
    fn roll_dice(&mut self) -> Result<(u8, u8), RandomSourceError> {
        Ok(self.roll_pair())
    }

    fn pick(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }
}

/// Scripted test double: queued rolls and picks, consumed in order.
///
/// An exhausted roll queue reports `Unavailable`, which exercises the
/// engine's local-fallback path; an exhausted pick queue yields 0.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    rolls: VecDeque<(u8, u8)>,
    picks: VecDeque<usize>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_roll(&mut self, die1: u8, die2: u8) {
        self.rolls.push_back((die1, die2));
    }

    pub fn push_pick(&mut self, index: usize) {
        self.picks.push_back(index);
    }
}

impl RandomSource for ScriptedRandom {
    fn roll_dice(&mut self) -> Result<(u8, u8), RandomSourceError> {
        self.rolls
            .pop_front()
            .ok_or_else(|| RandomSourceError::Unavailable("script exhausted".into()))
    }

    fn pick(&mut self, bound: usize) -> usize {
        self.picks.pop_front().map(|i| i % bound).unwrap_or(0)
    }
}
