//! Bounded, newest-first history read-models fed by the engine.

use crate::ledger::GameOutcome;
use crate::round::Multiplier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Entries kept per history list; the oldest entry is evicted on overflow.
pub const HISTORY_CAPACITY: usize = 10;

/// Fixed-capacity list ordered newest first.
#[derive(Clone, Debug)]
pub struct BoundedHistory<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Iterate newest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> BoundedHistory<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

impl<T> Default for BoundedHistory<T> {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

/// One completed round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round_id: Uuid,
    pub crash_point: Multiplier,
    pub ended_at: DateTime<Utc>,
}

/// One settled wager of the player's own.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BetRecord {
    pub round_id: Uuid,
    pub outcome: GameOutcome,
    pub bet_amount: u64,
    pub payout: u64,
    pub multiplier: Multiplier,
    pub summary: String,
    pub settled_at: DateTime<Utc>,
}
