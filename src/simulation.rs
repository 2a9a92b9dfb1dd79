//! Simulated co-players.
//!
//! Pure atmosphere: the pool draws its own bets and thresholds from the
//! shared random source, reacts to multiplier ticks, and reports outcomes
//! through the event bus. It never touches the real ledger or the crash
//! point.

use crate::config::PoolConfig;
use crate::events::{EventBus, GameEvent};
use crate::round::Multiplier;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a simulated player stands within the current round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Sitting this round out.
    Waiting,
    /// Bet placed, still riding the multiplier.
    Betting,
    CashedOut,
    Lost,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerStatus::Waiting => write!(f, "waiting"),
            PlayerStatus::Betting => write!(f, "betting"),
            PlayerStatus::CashedOut => write!(f, "cashed_out"),
            PlayerStatus::Lost => write!(f, "lost"),
        }
    }
}

/// One cosmetic co-player.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulatedPlayer {
    pub name: String,
    pub status: PlayerStatus,
    /// Zero when the player sat the round out.
    pub bet_amount: u64,
    pub auto_cash_out: Option<Multiplier>,
}

/// Pool of simulated players, redrawn once per round.
pub struct SimulatedPlayerPool {
    players: Vec<SimulatedPlayer>,
    config: PoolConfig,
    events: EventBus,
}

impl SimulatedPlayerPool {
    pub fn new(config: PoolConfig, events: EventBus) -> Self {
        let players = config
            .player_names
            .iter()
            .map(|name| SimulatedPlayer {
                name: name.clone(),
                status: PlayerStatus::Waiting,
                bet_amount: 0,
                auto_cash_out: None,
            })
            .collect();
        Self {
            players,
            config,
            events,
        }
    }

    pub fn players(&self) -> &[SimulatedPlayer] {
        &self.players
    }

    /// Redraw every player's participation for a new round. Runs once per
    /// round, before the ascent begins.
    pub fn refresh_for_new_round<R: Rng>(&mut self, rng: &mut R) {
        for player in &mut self.players {
            if rng.gen_bool(self.config.bet_probability) {
                player.bet_amount = rng.gen_range(self.config.min_bet..=self.config.max_bet);
                player.auto_cash_out = if rng.gen_bool(self.config.auto_cash_out_probability) {
                    let threshold = rng.gen_range(
                        self.config.min_auto_cash_out..=self.config.max_auto_cash_out,
                    );
                    Some(Multiplier::from_f64(threshold))
                } else {
                    None
                };
                player.status = PlayerStatus::Betting;
                self.events.emit(GameEvent::SimulatedPlayerUpdated {
                    name: player.name.clone(),
                    status: player.status,
                    multiplier: None,
                    bet_amount: player.bet_amount,
                });
            } else {
                player.bet_amount = 0;
                player.auto_cash_out = None;
                player.status = PlayerStatus::Waiting;
            }
        }
    }

    /// Cash out every betting player whose threshold has been reached.
    /// Runs on every tick, before the crash comparison.
    pub fn evaluate_tick(&mut self, multiplier: Multiplier) {
        for player in &mut self.players {
            if player.status != PlayerStatus::Betting {
                continue;
            }
            if let Some(threshold) = player.auto_cash_out {
                if threshold <= multiplier {
                    player.status = PlayerStatus::CashedOut;
                    self.events.emit(GameEvent::SimulatedPlayerUpdated {
                        name: player.name.clone(),
                        status: player.status,
                        multiplier: Some(threshold),
                        bet_amount: player.bet_amount,
                    });
                }
            }
        }
    }

    /// Final resolution when the round crashes. A betting player whose
    /// threshold sits below the crash point is treated as having cashed out
    /// already; everyone else still in loses.
    pub fn resolve_crash(&mut self, crash_point: Multiplier) {
        for player in &mut self.players {
            if player.status != PlayerStatus::Betting {
                continue;
            }
            let realized = match player.auto_cash_out {
                Some(threshold) if threshold < crash_point => {
                    player.status = PlayerStatus::CashedOut;
                    Some(threshold)
                }
                _ => {
                    player.status = PlayerStatus::Lost;
                    None
                }
            };
            tracing::trace!(
                name = %player.name,
                status = %player.status,
                bet = player.bet_amount,
                "simulated player resolved"
            );
            self.events.emit(GameEvent::SimulatedPlayerUpdated {
                name: player.name.clone(),
                status: player.status,
                multiplier: realized,
                bet_amount: player.bet_amount,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool() -> SimulatedPlayerPool {
        SimulatedPlayerPool::new(PoolConfig::default(), EventBus::default())
    }

    fn always_betting_pool() -> SimulatedPlayerPool {
        let config = PoolConfig {
            bet_probability: 1.0,
            auto_cash_out_probability: 1.0,
            ..PoolConfig::default()
        };
        SimulatedPlayerPool::new(config, EventBus::default())
    }

    #[test]
    fn refresh_draws_bets_within_configured_ranges() {
        let mut pool = pool();
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..50 {
            pool.refresh_for_new_round(&mut rng);
            for player in pool.players() {
                match player.status {
                    PlayerStatus::Betting => {
                        assert!((10..=500).contains(&player.bet_amount));
                        if let Some(threshold) = player.auto_cash_out {
                            assert!(threshold >= Multiplier::from_hundredths(110));
                            assert!(threshold <= Multiplier::from_hundredths(610));
                        }
                    }
                    PlayerStatus::Waiting => {
                        assert_eq!(player.bet_amount, 0);
                        assert!(player.auto_cash_out.is_none());
                    }
                    other => panic!("unexpected status after refresh: {other}"),
                }
            }
        }
    }

    #[test]
    fn refresh_resets_previous_round_outcomes() {
        let mut pool = always_betting_pool();
        let mut rng = StdRng::seed_from_u64(8);

        pool.refresh_for_new_round(&mut rng);
        pool.resolve_crash(Multiplier::from_hundredths(101));
        assert!(pool
            .players()
            .iter()
            .all(|p| p.status != PlayerStatus::Betting));

        pool.refresh_for_new_round(&mut rng);
        assert!(pool
            .players()
            .iter()
            .all(|p| p.status == PlayerStatus::Betting));
    }

    #[test]
    fn evaluate_tick_cashes_out_at_threshold() {
        let mut pool = always_betting_pool();
        let mut rng = StdRng::seed_from_u64(13);
        pool.refresh_for_new_round(&mut rng);

        // Below every possible threshold: nobody moves.
        pool.evaluate_tick(Multiplier::from_hundredths(109));
        assert!(pool
            .players()
            .iter()
            .all(|p| p.status == PlayerStatus::Betting));

        // At the top of the threshold range: everyone has cashed out.
        pool.evaluate_tick(Multiplier::from_hundredths(610));
        assert!(pool
            .players()
            .iter()
            .all(|p| p.status == PlayerStatus::CashedOut));
    }

    #[test]
    fn resolve_crash_applies_defensive_cash_out_rule() {
        let mut pool = always_betting_pool();
        let mut rng = StdRng::seed_from_u64(21);
        pool.refresh_for_new_round(&mut rng);

        // Skip tick evaluation entirely; resolution must still credit
        // thresholds strictly below the crash point.
        let crash_point = Multiplier::from_hundredths(350);
        pool.resolve_crash(crash_point);

        for player in pool.players() {
            match player.auto_cash_out {
                Some(threshold) if threshold < crash_point => {
                    assert_eq!(player.status, PlayerStatus::CashedOut)
                }
                _ => assert_eq!(player.status, PlayerStatus::Lost),
            }
        }
    }

    #[test]
    fn cash_out_events_carry_the_threshold_as_realized_multiplier() {
        let mut pool = always_betting_pool();
        let mut rng = StdRng::seed_from_u64(34);
        let mut rx = pool.events.subscribe();

        pool.refresh_for_new_round(&mut rng);
        pool.evaluate_tick(Multiplier::from_hundredths(610));

        let mut cash_outs = 0;
        while let Ok(event) = rx.try_recv() {
            if let GameEvent::SimulatedPlayerUpdated {
                status: PlayerStatus::CashedOut,
                multiplier,
                ..
            } = event
            {
                assert!(multiplier.is_some());
                cash_outs += 1;
            }
        }
        assert_eq!(cash_outs, pool.players().len());
    }
}
