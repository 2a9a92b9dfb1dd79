//! Error types for player-facing game operations.
//!
//! Everything here is recoverable: a rejected action mutates no state and is
//! surfaced straight back to the caller.

use std::fmt;
use thiserror::Error;

/// Why a bet was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidBetReason {
    /// Bet amount was zero.
    NonPositiveAmount,
    /// Bet amount exceeds the current balance.
    ExceedsBalance,
    /// A wager is already active for this round.
    WagerAlreadyActive,
    /// The betting window is not open.
    BettingClosed,
}

impl fmt::Display for InvalidBetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidBetReason::NonPositiveAmount => write!(f, "amount must be positive"),
            InvalidBetReason::ExceedsBalance => write!(f, "amount exceeds balance"),
            InvalidBetReason::WagerAlreadyActive => write!(f, "a wager is already active"),
            InvalidBetReason::BettingClosed => write!(f, "betting is closed"),
        }
    }
}

/// Errors returned by player actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("invalid bet: {0}")]
    InvalidBet(InvalidBetReason),

    #[error("no live wager to cash out")]
    NoActiveWager,

    #[error("wager already settled for this round")]
    AlreadyCashedOut,

    #[error("engine is no longer running")]
    EngineClosed,
}

/// Convenience alias for player-action results.
pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_rejection_reason() {
        let err = GameError::InvalidBet(InvalidBetReason::ExceedsBalance);
        assert_eq!(err.to_string(), "invalid bet: amount exceeds balance");
    }
}
