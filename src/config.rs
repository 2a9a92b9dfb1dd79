//! Configuration with validation and defaults.
//!
//! All tunables live here: phase timings, sampler shape, the simulated
//! player pool, the starting balance, and the optional deterministic seed.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Top-level game configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Demo-coin balance the session starts with.
    pub starting_balance: u64,
    pub timing: TimingConfig,
    pub sampler: SamplerConfig,
    pub pool: PoolConfig,
    /// Fixed seed for the random source; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_balance: 10_000,
            timing: TimingConfig::default(),
            sampler: SamplerConfig::default(),
            pool: PoolConfig::default(),
            seed: None,
        }
    }
}

/// Phase durations and the tick period.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Betting window before the ascent starts.
    pub betting_window_ms: u64,
    /// Period of the multiplier tick during the ascent.
    pub tick_interval_ms: u64,
    /// Hundredths added to the multiplier per tick.
    pub tick_increment: u32,
    /// Hold after a crash before the next betting window.
    pub post_crash_dwell_ms: u64,
    /// Pause before re-opening betting when a window closed with no wager.
    pub no_wager_pause_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            betting_window_ms: 5_000,
            tick_interval_ms: 50,
            tick_increment: 1,
            post_crash_dwell_ms: 3_000,
            no_wager_pause_ms: 3_000,
        }
    }
}

impl TimingConfig {
    pub fn betting_window(&self) -> Duration {
        Duration::from_millis(self.betting_window_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn post_crash_dwell(&self) -> Duration {
        Duration::from_millis(self.post_crash_dwell_ms)
    }

    pub fn no_wager_pause(&self) -> Duration {
        Duration::from_millis(self.no_wager_pause_ms)
    }
}

/// Crash-point distribution shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Probability of an instant 1.00x bust.
    pub instant_bust_probability: f64,
    /// Lower clamp for sampled crash points (decimal multiplier).
    pub min_crash: f64,
    /// Upper clamp for sampled crash points (decimal multiplier).
    pub max_crash: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            instant_bust_probability: 0.01,
            min_crash: 1.01,
            max_crash: 200.0,
        }
    }
}

/// Simulated co-player pool behavior.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Display handles; one simulated player per entry.
    pub player_names: Vec<String>,
    /// Probability a player bets in a given round.
    pub bet_probability: f64,
    /// Probability a betting player also sets an auto cash-out threshold.
    pub auto_cash_out_probability: f64,
    /// Inclusive bet range in demo coins.
    pub min_bet: u64,
    pub max_bet: u64,
    /// Inclusive auto cash-out threshold range (decimal multiplier).
    pub min_auto_cash_out: f64,
    pub max_auto_cash_out: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            player_names: [
                "NovaRider", "CometChaser", "HighRoller7", "TurbineKid",
                "MistyPeak", "VaporTrail", "OrbitQueen", "RedlinePete",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            bet_probability: 0.7,
            auto_cash_out_probability: 0.8,
            min_bet: 10,
            max_bet: 500,
            min_auto_cash_out: 1.10,
            max_auto_cash_out: 6.10,
        }
    }
}

impl GameConfig {
    /// Short windows for integration tests and quick demos. Game semantics
    /// are unchanged; only the clock runs faster.
    pub fn accelerated() -> Self {
        Self {
            timing: TimingConfig {
                betting_window_ms: 40,
                tick_interval_ms: 5,
                tick_increment: 1,
                post_crash_dwell_ms: 20,
                no_wager_pause_ms: 20,
            },
            ..Default::default()
        }
    }

    /// Load from a TOML file. Missing fields fall back to defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        let config: GameConfig =
            toml::from_str(&raw).map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate logical consistency before the engine starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.betting_window_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "betting_window_ms must be > 0".to_string(),
            ));
        }
        if self.timing.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "tick_interval_ms must be > 0".to_string(),
            ));
        }
        if self.timing.tick_increment == 0 {
            return Err(ConfigError::InvalidValue(
                "tick_increment must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.sampler.instant_bust_probability) {
            return Err(ConfigError::InvalidValue(
                "instant_bust_probability must be within [0, 1]".to_string(),
            ));
        }
        if self.sampler.min_crash < 1.0 || self.sampler.min_crash > self.sampler.max_crash {
            return Err(ConfigError::InvalidValue(
                "crash clamp must satisfy 1.0 <= min_crash <= max_crash".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.pool.bet_probability)
            || !(0.0..=1.0).contains(&self.pool.auto_cash_out_probability)
        {
            return Err(ConfigError::InvalidValue(
                "pool probabilities must be within [0, 1]".to_string(),
            ));
        }
        if self.pool.min_bet == 0 || self.pool.min_bet > self.pool.max_bet {
            return Err(ConfigError::InvalidValue(
                "pool bet range must satisfy 0 < min_bet <= max_bet".to_string(),
            ));
        }
        if self.pool.min_auto_cash_out < 1.0
            || self.pool.min_auto_cash_out > self.pool.max_auto_cash_out
        {
            return Err(ConfigError::InvalidValue(
                "pool threshold range must satisfy 1.0 <= min <= max".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("failed to load configuration: {0}")]
    LoadFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn accelerated_config_is_valid() {
        assert!(GameConfig::accelerated().validate().is_ok());
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let mut config = GameConfig::default();
        config.timing.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_crash_clamp_is_rejected() {
        let mut config = GameConfig::default();
        config.sampler.min_crash = 50.0;
        config.sampler.max_crash = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let mut config = GameConfig::default();
        config.pool.bet_probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn duration_accessors() {
        let timing = TimingConfig::default();
        assert_eq!(timing.betting_window(), Duration::from_millis(5_000));
        assert_eq!(timing.tick_interval(), Duration::from_millis(50));
        assert_eq!(timing.post_crash_dwell(), Duration::from_millis(3_000));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: GameConfig = toml::from_str("starting_balance = 500").unwrap();
        assert_eq!(config.starting_balance, 500);
        assert_eq!(config.timing.tick_interval_ms, 50);
    }
}
