//! Wager settlement ledger.
//!
//! Owns the player balance and the single active wager. The stake leaves the
//! balance at placement so the balance always reflects risk; settlement then
//! either credits winnings (cash-out) or records the loss (no further
//! balance change). Each placed wager is resolved exactly once.

use crate::errors::{GameError, GameResult, InvalidBetReason};
use crate::events::{EventBus, GameEvent};
use crate::round::{Multiplier, RoundPhase};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Win or loss, from the player's point of view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    Win,
    Loss,
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOutcome::Win => write!(f, "win"),
            GameOutcome::Loss => write!(f, "loss"),
        }
    }
}

/// Resolution state of a wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WagerState {
    /// Placed, not yet settled.
    Active,
    /// Settled as a win at the given multiplier.
    CashedOut { multiplier: Multiplier },
    /// Settled as a loss when the round crashed.
    Lost { crash_point: Multiplier },
}

/// The player's stake for the current round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wager {
    pub amount: u64,
    /// Threshold at which the engine cashes out automatically; bound at
    /// placement and immutable for the round.
    pub auto_cash_out: Option<Multiplier>,
    pub state: WagerState,
}

impl Wager {
    pub fn is_resolved(&self) -> bool {
        !matches!(self.state, WagerState::Active)
    }
}

/// Outcome of settling one wager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub outcome: GameOutcome,
    pub bet_amount: u64,
    /// Cash-out multiplier for wins, the crash point for losses.
    pub multiplier: Multiplier,
    /// Amount credited back to the balance; zero for losses.
    pub payout: u64,
}

impl Settlement {
    /// Human-readable one-liner for the outcome log.
    pub fn summary(&self) -> String {
        match self.outcome {
            GameOutcome::Win => format!(
                "Cashed out at {}. Bet: {}, Won: {}",
                self.multiplier, self.bet_amount, self.payout
            ),
            GameOutcome::Loss => format!(
                "Crashed at {}. Bet: {}, Lost: {}",
                self.multiplier, self.bet_amount, self.bet_amount
            ),
        }
    }
}

/// Balance plus at most one wager, settled exactly once per round.
pub struct WagerLedger {
    balance: u64,
    wager: Option<Wager>,
    events: EventBus,
}

impl WagerLedger {
    pub fn new(starting_balance: u64, events: EventBus) -> Self {
        Self {
            balance: starting_balance,
            wager: None,
            events,
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn wager(&self) -> Option<&Wager> {
        self.wager.as_ref()
    }

    pub fn has_active_wager(&self) -> bool {
        matches!(
            self.wager,
            Some(Wager {
                state: WagerState::Active,
                ..
            })
        )
    }

    /// True when an active wager's threshold is reached at `multiplier`.
    pub fn auto_cash_out_due(&self, multiplier: Multiplier) -> bool {
        matches!(
            self.wager,
            Some(Wager {
                state: WagerState::Active,
                auto_cash_out: Some(threshold),
                ..
            }) if multiplier >= threshold
        )
    }

    /// Place a wager during the betting window. The stake is deducted
    /// immediately; returns the new balance.
    pub fn place_bet(
        &mut self,
        amount: u64,
        auto_cash_out: Option<Multiplier>,
        phase: RoundPhase,
    ) -> GameResult<u64> {
        if phase != RoundPhase::Betting {
            return Err(GameError::InvalidBet(InvalidBetReason::BettingClosed));
        }
        if amount == 0 {
            return Err(GameError::InvalidBet(InvalidBetReason::NonPositiveAmount));
        }
        if amount > self.balance {
            return Err(GameError::InvalidBet(InvalidBetReason::ExceedsBalance));
        }
        if self.wager.is_some() {
            return Err(GameError::InvalidBet(InvalidBetReason::WagerAlreadyActive));
        }

        self.balance -= amount;
        self.wager = Some(Wager {
            amount,
            auto_cash_out,
            state: WagerState::Active,
        });
        self.events.emit(GameEvent::BalanceChanged {
            balance: self.balance,
        });
        Ok(self.balance)
    }

    /// Resolve the wager as a win at `multiplier` and credit the winnings.
    /// The round itself keeps running; only the wager is settled.
    pub fn cash_out(&mut self, multiplier: Multiplier) -> GameResult<Settlement> {
        let wager = self.wager.as_mut().ok_or(GameError::NoActiveWager)?;
        if wager.is_resolved() {
            return Err(GameError::AlreadyCashedOut);
        }

        let payout = multiplier.payout(wager.amount);
        wager.state = WagerState::CashedOut { multiplier };
        self.balance += payout;

        let settlement = Settlement {
            outcome: GameOutcome::Win,
            bet_amount: wager.amount,
            multiplier,
            payout,
        };
        self.events.emit(GameEvent::BalanceChanged {
            balance: self.balance,
        });
        self.events.emit(GameEvent::UserOutcomeLogged {
            outcome: settlement.outcome,
            bet_amount: settlement.bet_amount,
            payout: settlement.payout,
            multiplier: settlement.multiplier,
            summary: settlement.summary(),
        });
        Ok(settlement)
    }

    /// Resolve a still-active wager as a loss when the round crashes. The
    /// stake was deducted at placement, so the balance is untouched.
    /// Returns `None` when there is nothing left to settle.
    pub fn settle_loss(&mut self, crash_point: Multiplier) -> Option<Settlement> {
        let wager = self.wager.as_mut()?;
        if wager.is_resolved() {
            return None;
        }

        wager.state = WagerState::Lost { crash_point };
        let settlement = Settlement {
            outcome: GameOutcome::Loss,
            bet_amount: wager.amount,
            multiplier: crash_point,
            payout: 0,
        };
        self.events.emit(GameEvent::UserOutcomeLogged {
            outcome: settlement.outcome,
            bet_amount: settlement.bet_amount,
            payout: settlement.payout,
            multiplier: settlement.multiplier,
            summary: settlement.summary(),
        });
        Some(settlement)
    }

    /// Drop a settled wager when a new betting window opens. An unresolved
    /// wager placed while the previous window was re-arming is kept; it
    /// belongs to the upcoming round.
    pub fn reset(&mut self) {
        if self.wager.as_ref().map_or(false, Wager::is_resolved) {
            self.wager = None;
        }
    }
}
