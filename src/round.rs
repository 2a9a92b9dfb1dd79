//! Core round types: the multiplier scale, phases, and per-round state.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A multiplier expressed in integer hundredths (1.00x = 100, 200.00x = 20000).
///
/// Keeping the scale integral makes the per-tick increment, threshold
/// comparisons, and payout math exact; floating point only appears at the
/// sampling boundary.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Multiplier(u32);

impl Multiplier {
    /// The 1.00x floor every round starts from.
    pub const ONE: Multiplier = Multiplier(100);

    pub fn from_hundredths(hundredths: u32) -> Self {
        Multiplier(hundredths)
    }

    pub fn hundredths(self) -> u32 {
        self.0
    }

    /// Convert from a decimal value, rounding to two decimal places.
    pub fn from_f64(value: f64) -> Self {
        Multiplier((value * 100.0).round() as u32)
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Advance by `step` hundredths. Saturating, so the scale stays monotone.
    pub fn advance(self, step: u32) -> Self {
        Multiplier(self.0.saturating_add(step))
    }

    /// Winnings for a stake at this multiplier: `amount * hundredths / 100`,
    /// truncating. Widened to u128 so the product cannot overflow.
    pub fn payout(self, amount: u64) -> u64 {
        (u128::from(amount) * u128::from(self.0) / 100) as u64
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}x", self.0 / 100, self.0 % 100)
    }
}

/// Phase of the round lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundPhase {
    Idle,
    Betting,
    Ascending,
    Crashed,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::Idle => write!(f, "idle"),
            RoundPhase::Betting => write!(f, "betting"),
            RoundPhase::Ascending => write!(f, "ascending"),
            RoundPhase::Crashed => write!(f, "crashed"),
        }
    }
}

/// One play cycle. The crash point is set exactly once, when the ascent
/// starts, and stays hidden from subscribers until the round crashes.
#[derive(Clone, Debug)]
pub struct Round {
    pub id: Uuid,
    pub phase: RoundPhase,
    pub multiplier: Multiplier,
    crash_point: Option<Multiplier>,
}

impl Round {
    /// Placeholder round before the first betting window opens.
    pub fn idle() -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: RoundPhase::Idle,
            multiplier: Multiplier::ONE,
            crash_point: None,
        }
    }

    /// Fresh round entering its betting window, multiplier back at 1.00x.
    pub fn new_betting() -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: RoundPhase::Betting,
            multiplier: Multiplier::ONE,
            crash_point: None,
        }
    }

    /// Arm the ascent. The crash point can only be set once per round.
    pub fn start_ascent(&mut self, crash_point: Multiplier) {
        if self.crash_point.is_none() {
            self.crash_point = Some(crash_point);
            self.phase = RoundPhase::Ascending;
        }
    }

    pub fn crash_point(&self) -> Option<Multiplier> {
        self.crash_point
    }
}
