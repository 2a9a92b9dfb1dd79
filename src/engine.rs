//! Round lifecycle state machine.
//!
//! Goals:
//! - All mutable game state lives in one `GameSession`, owned by a single
//!   engine task; player actions arrive as commands on a channel, so no
//!   locking is needed and callbacks never overlap.
//! - Each phase awaits exactly one timer (window sleep or tick interval),
//!   dropped on transition, so a stale timer can never fire into a
//!   mismatched phase.
//! - Within a tick, cash-out evaluation (human first, then the simulated
//!   pool) runs before the crash comparison: a multiplier that satisfies
//!   both a threshold and the crash point settles as a cash-out.

use crate::config::{ConfigError, GameConfig};
use crate::errors::{GameError, GameResult};
use crate::events::{EventBus, GameEvent};
use crate::history::{BetRecord, BoundedHistory, RoundRecord};
use crate::ledger::{Settlement, WagerLedger};
use crate::round::{Multiplier, Round, RoundPhase};
use crate::sampler::CrashPointSampler;
use crate::simulation::SimulatedPlayerPool;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time;

/// Buffer for player-action commands into the engine task.
const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Result of applying one multiplier tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Crashed,
}

/// Player actions and queries served by the engine task.
enum Command {
    PlaceBet {
        amount: u64,
        auto_cash_out: Option<Multiplier>,
        reply: oneshot::Sender<GameResult<u64>>,
    },
    CashOut {
        reply: oneshot::Sender<GameResult<Settlement>>,
    },
    Balance {
        reply: oneshot::Sender<u64>,
    },
    Phase {
        reply: oneshot::Sender<RoundPhase>,
    },
    RoundHistory {
        reply: oneshot::Sender<Vec<RoundRecord>>,
    },
    BetHistory {
        reply: oneshot::Sender<Vec<BetRecord>>,
    },
    Shutdown,
}

/// The complete single-owner game state: round, ledger, pool, histories,
/// and the random source. Synchronous; the async engine task drives it.
pub struct GameSession {
    config: GameConfig,
    rng: StdRng,
    sampler: CrashPointSampler,
    ledger: WagerLedger,
    pool: SimulatedPlayerPool,
    round: Round,
    round_history: BoundedHistory<RoundRecord>,
    bet_history: BoundedHistory<BetRecord>,
    events: EventBus,
}

impl GameSession {
    pub fn new(config: GameConfig, events: EventBus) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            sampler: CrashPointSampler::new(config.sampler.clone()),
            ledger: WagerLedger::new(config.starting_balance, events.clone()),
            pool: SimulatedPlayerPool::new(config.pool.clone(), events.clone()),
            round: Round::idle(),
            round_history: BoundedHistory::default(),
            bet_history: BoundedHistory::default(),
            rng,
            config,
            events,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> RoundPhase {
        self.round.phase
    }

    pub fn multiplier(&self) -> Multiplier {
        self.round.multiplier
    }

    pub fn balance(&self) -> u64 {
        self.ledger.balance()
    }

    pub fn has_active_wager(&self) -> bool {
        self.ledger.has_active_wager()
    }

    pub fn round_history(&self) -> &BoundedHistory<RoundRecord> {
        &self.round_history
    }

    pub fn bet_history(&self) -> &BoundedHistory<BetRecord> {
        &self.bet_history
    }

    /// Open a betting window: fresh round, multiplier back at 1.00x, settled
    /// wager cleared.
    pub fn begin_betting(&mut self) {
        self.ledger.reset();
        self.round = Round::new_betting();
        tracing::debug!(round = %self.round.id, "betting window open");
        self.events.emit(GameEvent::PhaseChanged {
            phase: RoundPhase::Betting,
            duration_ms: Some(self.config.timing.betting_window_ms),
        });
    }

    /// Start the ascent: sample the crash point (once), then redraw the
    /// simulated pool.
    pub fn begin_ascending(&mut self) {
        let crash_point = self.sampler.sample(&mut self.rng);
        self.round.start_ascent(crash_point);
        tracing::debug!(round = %self.round.id, "ascent started");
        self.events.emit(GameEvent::PhaseChanged {
            phase: RoundPhase::Ascending,
            duration_ms: None,
        });
        self.pool.refresh_for_new_round(&mut self.rng);
    }

    /// One multiplier tick: advance, notify, evaluate cash-outs (human, then
    /// pool), and only then compare against the crash point.
    pub fn apply_tick(&mut self) -> TickOutcome {
        self.round.multiplier = self
            .round
            .multiplier
            .advance(self.config.timing.tick_increment);
        let multiplier = self.round.multiplier;
        self.events.emit(GameEvent::MultiplierTick {
            multiplier,
            phase: self.round.phase,
        });

        if self.ledger.auto_cash_out_due(multiplier) {
            if let Ok(settlement) = self.ledger.cash_out(multiplier) {
                self.record_settlement(settlement);
            }
        }
        self.pool.evaluate_tick(multiplier);

        match self.round.crash_point() {
            Some(crash_point) if multiplier >= crash_point => TickOutcome::Crashed,
            _ => TickOutcome::Continue,
        }
    }

    /// Enter Crashed: settle an outstanding wager as a loss, resolve the
    /// pool, and append the round to history.
    pub fn finish_round(&mut self) {
        self.round.phase = RoundPhase::Crashed;
        let crash_point = self.round.crash_point().unwrap_or(self.round.multiplier);
        tracing::debug!(round = %self.round.id, %crash_point, "round crashed");
        self.events.emit(GameEvent::PhaseChanged {
            phase: RoundPhase::Crashed,
            duration_ms: Some(self.config.timing.post_crash_dwell_ms),
        });

        if let Some(settlement) = self.ledger.settle_loss(crash_point) {
            self.record_settlement(settlement);
        }
        self.pool.resolve_crash(crash_point);

        self.round_history.push(RoundRecord {
            round_id: self.round.id,
            crash_point,
            ended_at: Utc::now(),
        });
        self.events.emit(GameEvent::RoundHistoryAppended { crash_point });
    }

    /// Place the player's wager for the current (or upcoming) round.
    pub fn place_bet(
        &mut self,
        amount: u64,
        auto_cash_out: Option<Multiplier>,
    ) -> GameResult<u64> {
        self.ledger.place_bet(amount, auto_cash_out, self.round.phase)
    }

    /// Manual cash-out at the current multiplier. Valid only while the
    /// round is ascending; afterwards the wager is already settled.
    pub fn cash_out(&mut self) -> GameResult<Settlement> {
        match self.round.phase {
            RoundPhase::Ascending => {
                let settlement = self.ledger.cash_out(self.round.multiplier)?;
                self.record_settlement(settlement.clone());
                Ok(settlement)
            }
            RoundPhase::Crashed => Err(if self.ledger.wager().is_some() {
                GameError::AlreadyCashedOut
            } else {
                GameError::NoActiveWager
            }),
            RoundPhase::Idle | RoundPhase::Betting => Err(GameError::NoActiveWager),
        }
    }

    fn record_settlement(&mut self, settlement: Settlement) {
        self.bet_history.push(BetRecord {
            round_id: self.round.id,
            outcome: settlement.outcome,
            bet_amount: settlement.bet_amount,
            payout: settlement.payout,
            multiplier: settlement.multiplier,
            summary: settlement.summary(),
            settled_at: Utc::now(),
        });
    }

    /// Serve one command. Returns `false` when shutdown was requested.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::PlaceBet {
                amount,
                auto_cash_out,
                reply,
            } => {
                let _ = reply.send(self.place_bet(amount, auto_cash_out));
            }
            Command::CashOut { reply } => {
                let _ = reply.send(self.cash_out());
            }
            Command::Balance { reply } => {
                let _ = reply.send(self.ledger.balance());
            }
            Command::Phase { reply } => {
                let _ = reply.send(self.round.phase);
            }
            Command::RoundHistory { reply } => {
                let _ = reply.send(self.round_history.to_vec());
            }
            Command::BetHistory { reply } => {
                let _ = reply.send(self.bet_history.to_vec());
            }
            Command::Shutdown => return false,
        }
        true
    }
}

/// Spawns the engine task and hands out the player-facing handle.
pub struct CrashEngine;

impl CrashEngine {
    pub fn spawn(config: GameConfig) -> Result<EngineHandle, ConfigError> {
        config.validate()?;
        let events = EventBus::default();
        let session = GameSession::new(config, events.clone());
        let (commands, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        tokio::spawn(run_loop(session, command_rx));
        Ok(EngineHandle { commands, events })
    }
}

/// Cloneable surface for one player session: the two game actions, a few
/// read queries, and event subscription.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    events: EventBus,
}

impl EngineHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub async fn place_bet(
        &self,
        amount: u64,
        auto_cash_out: Option<Multiplier>,
    ) -> GameResult<u64> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::PlaceBet {
                amount,
                auto_cash_out,
                reply,
            })
            .await
            .map_err(|_| GameError::EngineClosed)?;
        rx.await.map_err(|_| GameError::EngineClosed)?
    }

    pub async fn cash_out(&self) -> GameResult<Settlement> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::CashOut { reply })
            .await
            .map_err(|_| GameError::EngineClosed)?;
        rx.await.map_err(|_| GameError::EngineClosed)?
    }

    pub async fn balance(&self) -> GameResult<u64> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Balance { reply })
            .await
            .map_err(|_| GameError::EngineClosed)?;
        rx.await.map_err(|_| GameError::EngineClosed)
    }

    pub async fn phase(&self) -> GameResult<RoundPhase> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Phase { reply })
            .await
            .map_err(|_| GameError::EngineClosed)?;
        rx.await.map_err(|_| GameError::EngineClosed)
    }

    pub async fn round_history(&self) -> GameResult<Vec<RoundRecord>> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::RoundHistory { reply })
            .await
            .map_err(|_| GameError::EngineClosed)?;
        rx.await.map_err(|_| GameError::EngineClosed)
    }

    pub async fn bet_history(&self) -> GameResult<Vec<BetRecord>> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::BetHistory { reply })
            .await
            .map_err(|_| GameError::EngineClosed)?;
        rx.await.map_err(|_| GameError::EngineClosed)
    }

    /// Stop the engine task. Pending queries on other clones get
    /// `EngineClosed`.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }
}

/// The engine task: cycles Betting -> Ascending -> Crashed forever, serving
/// player commands at every suspension point.
async fn run_loop(mut session: GameSession, mut commands: mpsc::Receiver<Command>) {
    let timing = session.config().timing.clone();
    'rounds: loop {
        session.begin_betting();
        if !serve_for(&mut session, &mut commands, timing.betting_window()).await {
            break;
        }

        if !session.has_active_wager() {
            // No silent auto-play: nobody staked, so pause briefly and
            // re-open the window instead of running an empty round.
            tracing::info!("betting window closed with no wager; re-opening");
            if !serve_for(&mut session, &mut commands, timing.no_wager_pause()).await {
                break;
            }
            continue;
        }

        session.begin_ascending();
        let mut ticker = time::interval(timing.tick_interval());
        // An interval's first tick completes immediately; consume it so the
        // first increment lands one full period after the ascent starts.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if session.apply_tick() == TickOutcome::Crashed {
                        break;
                    }
                }
                command = commands.recv() => match command {
                    Some(command) => {
                        if !session.handle_command(command) {
                            break 'rounds;
                        }
                    }
                    None => break 'rounds,
                },
            }
        }
        // The tick scheduler stops before any crash handling runs.
        drop(ticker);

        session.finish_round();
        if !serve_for(&mut session, &mut commands, timing.post_crash_dwell()).await {
            break;
        }
    }
    tracing::debug!("engine task stopped");
}

/// Hold the current phase for `duration` while serving commands. Returns
/// `false` when shutdown was requested or every handle was dropped.
async fn serve_for(
    session: &mut GameSession,
    commands: &mut mpsc::Receiver<Command>,
    duration: Duration,
) -> bool {
    let deadline = time::sleep(duration);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => return true,
            command = commands.recv() => match command {
                Some(command) => {
                    if !session.handle_command(command) {
                        return false;
                    }
                }
                None => return false,
            },
        }
    }
}
