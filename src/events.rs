//! Notification boundary between the game core and any presentation layer.
//!
//! The core publishes `GameEvent`s on a broadcast channel; a console, a GUI,
//! or a test harness subscribes and renders. Subscribers never mutate core
//! state through this channel.

use crate::ledger::GameOutcome;
use crate::round::{Multiplier, RoundPhase};
use crate::simulation::PlayerStatus;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default buffer for the event channel; slow subscribers lag rather than
/// blocking the engine.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// State-change notifications emitted by the game core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// Player balance changed (bet placed or cash-out credited).
    #[serde(rename = "balance_changed")]
    BalanceChanged { balance: u64 },

    /// Multiplier advanced one step during the ascent.
    #[serde(rename = "multiplier_tick")]
    MultiplierTick {
        multiplier: Multiplier,
        phase: RoundPhase,
    },

    /// The round moved to a new phase. `duration_ms` carries the phase's
    /// scheduled dwell when it has one (betting window, post-crash hold).
    #[serde(rename = "phase_changed")]
    PhaseChanged {
        phase: RoundPhase,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
    },

    /// A completed round's crash point was appended to the history.
    #[serde(rename = "round_history_appended")]
    RoundHistoryAppended { crash_point: Multiplier },

    /// The player's wager settled, as a win or a loss.
    #[serde(rename = "user_outcome")]
    UserOutcomeLogged {
        outcome: GameOutcome,
        bet_amount: u64,
        payout: u64,
        multiplier: Multiplier,
        summary: String,
    },

    /// A simulated co-player changed status. `multiplier` is the realized
    /// cash-out threshold when the status is a cash-out, `None` otherwise.
    #[serde(rename = "simulated_player_updated")]
    SimulatedPlayerUpdated {
        name: String,
        status: PlayerStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        multiplier: Option<Multiplier>,
        bet_amount: u64,
    },
}

/// Cloneable publisher handle around the broadcast channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GameEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, event: GameEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}
