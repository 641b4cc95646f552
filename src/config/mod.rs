//! Table configuration
//!
//! All table rules live in one serde-derived structure so a host can load
//! and persist them as TOML. Validation is explicit: a config is checked
//! once on load and the engine then trusts it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Rules and pacing for one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of 52-card decks in the shoe
    pub decks: usize,
    /// Deal every participant their initial hand first, then start play.
    /// When disabled each participant plays out immediately after their deal.
    pub first_deal_then_play: bool,
    /// Only allow splitting pairs of identical face value (two eights),
    /// not merely equal pip value (king and ten)
    pub identical_split_only: bool,
    /// Permit double-down on hands created by a split
    pub allow_double_down_after_split: bool,
    /// Upper bound on hands one participant can hold through splitting
    pub max_hands_per_participant: usize,
    /// Payout multiplier for an ordinary win
    pub normal_win_multiplier: f32,
    /// Payout multiplier for a natural two-card blackjack
    pub blackjack_win_multiplier: f32,
    /// Payout multiplier for a 21 reached with three or more cards
    pub dirty_blackjack_win_multiplier: f32,
    /// On a pushed double-down hand, refund the full doubled stake.
    /// When disabled only the original half of the stake comes back.
    pub refund_double_down_on_push: bool,
    /// Global scale applied to every step delay
    pub command_speed_multiplier: f32,
    /// Aggregate the round result into one consolidated message instead of
    /// one result chain per hand
    pub compact_results: bool,
    /// Executor pacing and draw-wait bounds
    pub timing: ExecutorTiming,
}

/// Pacing knobs for the command-chain executor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorTiming {
    /// Interval between checks while suspended on an external draw
    #[serde(with = "humantime_serde")]
    pub draw_poll_interval: Duration,
    /// Number of poll intervals before a draw wait is abandoned and the
    /// chain continues without a result
    pub max_draw_polls: u32,
    /// Floor applied to every scaled step delay
    #[serde(with = "humantime_serde")]
    pub min_step_delay: Duration,
}

impl Default for ExecutorTiming {
    fn default() -> Self {
        // 600 polls at 50ms gives the 30 second safety timeout
        Self {
            draw_poll_interval: Duration::from_millis(50),
            max_draw_polls: 600,
            min_step_delay: Duration::from_millis(100),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            decks: 12,
            first_deal_then_play: true,
            identical_split_only: true,
            allow_double_down_after_split: false,
            max_hands_per_participant: 2,
            normal_win_multiplier: 1.0,
            blackjack_win_multiplier: 1.5,
            dirty_blackjack_win_multiplier: 1.0,
            refund_double_down_on_push: false,
            command_speed_multiplier: 1.0,
            compact_results: false,
            timing: ExecutorTiming::default(),
        }
    }
}

impl GameConfig {
    /// Load and validate a configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: GameConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Persist the configuration as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.decks == 0 {
            return Err(Error::Config("decks must be at least 1".into()));
        }
        if self.max_hands_per_participant == 0 {
            return Err(Error::Config(
                "max_hands_per_participant must be at least 1".into(),
            ));
        }
        if self.command_speed_multiplier <= 0.0 {
            return Err(Error::Config(
                "command_speed_multiplier must be positive".into(),
            ));
        }
        for (name, mult) in [
            ("normal_win_multiplier", self.normal_win_multiplier),
            ("blackjack_win_multiplier", self.blackjack_win_multiplier),
            (
                "dirty_blackjack_win_multiplier",
                self.dirty_blackjack_win_multiplier,
            ),
        ] {
            if mult < 0.0 {
                return Err(Error::Config(format!("{} must not be negative", name)));
            }
        }
        if self.timing.max_draw_polls == 0 {
            return Err(Error::Config("max_draw_polls must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_decks() {
        let mut config = GameConfig::default();
        config.decks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_speed() {
        let mut config = GameConfig::default();
        config.command_speed_multiplier = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.toml");

        let mut config = GameConfig::default();
        config.compact_results = true;
        config.decks = 4;
        config.save(&path).unwrap();

        let loaded = GameConfig::load(&path).unwrap();
        assert_eq!(loaded.decks, 4);
        assert!(loaded.compact_results);
        assert_eq!(
            loaded.timing.draw_poll_interval,
            config.timing.draw_poll_interval
        );
    }
}
