//! Match tuning.
//!
//! Every timing and economy constant lives in [`MatchConfig`] so a match can
//! be re-tuned from a RON file without touching code. Missing fields fall
//! back to the defaults below.
//!
//! ```ron
//! MatchConfig(
//!     energy_per_tick: 10,
//!     seed: 7,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Tunable constants for one match. All durations are in ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Wall-clock length of one tick in milliseconds (for collaborators).
    pub tick_ms: u64,
    /// Delay used when a unit defers its next decision.
    pub decision_delay: u64,
    /// Period of the AFK watchdog.
    pub watchdog_interval: u64,
    /// Period of the territory and energy recomputation.
    pub economy_interval: u64,
    /// Period of each team's spawn decision.
    pub team_ai_interval: u64,
    /// Energy added per economy tick.
    pub energy_per_tick: i32,
    /// Maximum energy contributed by each sensor structure.
    pub energy_per_sensor: i32,
    /// Energy each team starts with.
    pub starting_energy: i32,
    /// Control radius in pixels for entities without a weapon.
    pub default_sensor_radius: f32,
    /// Consecutive refused moves before a tank gives up its path.
    pub blocked_move_limit: u32,
    /// Facing error in degrees a turret tolerates before firing.
    pub aim_tolerance: f32,
    /// Points for destroying a structure that neither moves nor rotates.
    pub score_fixed: u32,
    /// Points for destroying a structure that only rotates.
    pub score_rotating: u32,
    /// Points for destroying a mobile unit.
    pub score_mobile: u32,
    /// Seed for the team AI's random choices.
    pub seed: u64,
}

/// Default wall-clock tick length.
const TICK_MS: u64 = 100;

/// Idle time after which the watchdog forces a decision.
const WATCHDOG_MS: u64 = 500;

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            decision_delay: 1,
            watchdog_interval: ticks_for_ms(WATCHDOG_MS, TICK_MS),
            economy_interval: 10,
            team_ai_interval: 20,
            energy_per_tick: 5,
            energy_per_sensor: 100,
            starting_energy: 50,
            default_sensor_radius: 128.0,
            blocked_move_limit: 10,
            aim_tolerance: 5.0,
            score_fixed: 30,
            score_rotating: 20,
            score_mobile: 10,
            seed: 0,
        }
    }
}

impl MatchConfig {
    /// Parse a configuration from RON text.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| GameError::ConfigParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|e| GameError::ConfigParseError {
            path: label.clone(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&contents).map_err(|err| match err {
            GameError::ConfigParseError { message, .. } => GameError::ConfigParseError {
                path: label,
                message,
            },
            other => other,
        })
    }
}

/// Milliseconds expressed in whole ticks, never less than one.
fn ticks_for_ms(ms: u64, tick_ms: u64) -> u64 {
    (ms / tick_ms.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = MatchConfig::from_ron_str("(energy_per_tick: 12, seed: 99)").unwrap();
        assert_eq!(config.energy_per_tick, 12);
        assert_eq!(config.seed, 99);
        assert_eq!(config.watchdog_interval, MatchConfig::default().watchdog_interval);
    }

    #[test]
    fn test_bad_ron_is_reported() {
        let err = MatchConfig::from_ron_str("(energy_per_tick: \"lots\")").unwrap_err();
        assert!(matches!(err, GameError::ConfigParseError { .. }));
    }

    #[test]
    fn test_watchdog_is_half_a_second() {
        let config = MatchConfig::default();
        assert_eq!(config.watchdog_interval * config.tick_ms, 500);
        assert_eq!(ticks_for_ms(10, 100), 1);
        assert_eq!(ticks_for_ms(500, 0), 500);
    }

    #[test]
    fn test_load_reports_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("match.ron");
        std::fs::write(&good, "(team_ai_interval: 40)").unwrap();
        assert_eq!(MatchConfig::load(&good).unwrap().team_ai_interval, 40);

        let bad = dir.path().join("broken.ron");
        std::fs::write(&bad, "(seed: -)").unwrap();
        match MatchConfig::load(&bad) {
            Err(GameError::ConfigParseError { path, .. }) => {
                assert_eq!(path, bad.display().to_string());
            }
            other => panic!("expected parse error, got {other:?}"),
        }

        let missing = dir.path().join("missing.ron");
        assert!(matches!(
            MatchConfig::load(&missing),
            Err(GameError::ConfigParseError { .. })
        ));
    }
}
