//! liftoff - single-table multiplier-crash betting round engine.
//!
//! A shared multiplier climbs from 1.00x toward a hidden, pre-sampled crash
//! point; the player wagers during a betting window and must cash out before
//! the crash to win `bet * multiplier`. The crate owns the round lifecycle
//! state machine, the crash-point sampler, the wager settlement ledger, and
//! a cosmetic simulated-player pool. Presentation attaches through the
//! broadcast event stream and drives nothing except the two player actions.

pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod history;
pub mod ledger;
pub mod round;
pub mod sampler;
pub mod simulation;

pub use config::{ConfigError, GameConfig, PoolConfig, SamplerConfig, TimingConfig};
pub use engine::{CrashEngine, EngineHandle, GameSession, TickOutcome};
pub use errors::{GameError, GameResult, InvalidBetReason};
pub use events::{EventBus, GameEvent};
pub use history::{BetRecord, BoundedHistory, RoundRecord, HISTORY_CAPACITY};
pub use ledger::{GameOutcome, Settlement, Wager, WagerLedger, WagerState};
pub use round::{Multiplier, Round, RoundPhase};
pub use sampler::CrashPointSampler;
pub use simulation::{PlayerStatus, SimulatedPlayer, SimulatedPlayerPool};
