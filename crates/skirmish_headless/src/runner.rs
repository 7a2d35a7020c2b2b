//! Headless match runner.
//!
//! Runs a match to a tick limit (or until one side is wiped out) and streams
//! per-team status snapshots as JSON lines. Logs go to stderr; stdout only
//! carries snapshots.

use std::io::Write;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use skirmish_core::config::MatchConfig;
use skirmish_core::economy::TeamStatus;
use skirmish_core::error::GameError;
use skirmish_core::factions::Team;
use skirmish_core::grid::{MapData, MapObject};
use skirmish_core::simulation::{GameEvent, Simulation, StaticFootprints};

use crate::map_loader::MapLoadError;
use crate::scores::ScoreError;

/// Error type for running a match.
#[derive(Error, Debug)]
pub enum RunError {
    /// The map could not be loaded.
    #[error(transparent)]
    Map(#[from] MapLoadError),
    /// The core rejected the map or configuration.
    #[error(transparent)]
    Game(#[from] GameError),
    /// Writing snapshots failed.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    /// Serializing a snapshot failed.
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    /// The score file could not be updated.
    #[error(transparent)]
    Scores(#[from] ScoreError),
}

/// Runner settings.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Match tuning.
    pub match_config: MatchConfig,
    /// Tick limit.
    pub max_ticks: u64,
    /// Team left to a human; `None` lets the AI play both sides.
    pub player: Option<Team>,
    /// Emit a snapshot every this many ticks; 0 only emits the final one.
    pub report_every: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            max_ticks: 3000,
            player: None,
            report_every: 10,
        }
    }
}

/// One JSON line of output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tick the snapshot was taken after.
    pub tick: u64,
    /// Red then Blue.
    pub teams: Vec<TeamStatus>,
    /// Destructions since the previous snapshot.
    pub destroyed: usize,
    /// Set once one side has nothing left.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Team>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Ticks simulated.
    pub ticks: u64,
    /// Surviving side, if the match was decided.
    pub winner: Option<Team>,
    /// Final status of both teams.
    pub teams: Vec<TeamStatus>,
    /// Final state hash, for determinism checks.
    pub state_hash: u64,
}

impl MatchSummary {
    /// Final score of `team`.
    #[must_use]
    pub fn score_of(&self, team: Team) -> u32 {
        self.teams
            .iter()
            .find(|status| status.team == team)
            .map_or(0, |status| status.score)
    }
}

/// Drives one [`Simulation`] and reports on it.
#[derive(Debug)]
pub struct MatchRunner {
    sim: Simulation,
    config: RunConfig,
}

impl MatchRunner {
    /// Set up a match on `map`. Every tile-sized footprint comes from the
    /// map's tile size.
    pub fn new(map: &MapData, config: RunConfig) -> Result<Self, RunError> {
        let catalog = StaticFootprints::new(map.tile_width, map.tile_height);
        let mut sim = Simulation::new(config.match_config.clone(), Box::new(catalog));
        sim.attach_map(map)?;
        for team in Team::PLAYABLE {
            if Some(team) != config.player {
                sim.enable_team_ai(team);
            }
        }
        tracing::info!(
            ai = ?sim.ai_teams(),
            max_ticks = config.max_ticks,
            seed = config.match_config.seed,
            "match ready"
        );
        Ok(Self { sim, config })
    }

    /// The simulation being run.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Run to the tick limit or a decided match, writing snapshots to `out`.
    /// The last simulated tick always gets a snapshot.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<MatchSummary, RunError> {
        let mut destroyed = 0;
        let mut reported = None;

        while self.sim.get_tick() < self.config.max_ticks {
            let events = self.sim.tick();
            destroyed += events
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::Destroyed { .. }))
                .count();

            let winner = self.sim.winner();
            let every = self.config.report_every;
            if winner.is_some() || (every > 0 && events.tick % every == 0) {
                self.write_snapshot(out, destroyed, winner)?;
                destroyed = 0;
                reported = Some(events.tick);
            }
            if let Some(team) = winner {
                tracing::info!(tick = events.tick, winner = team.short_name(), "match decided");
                break;
            }
        }

        if reported != Some(self.sim.get_tick()) {
            self.write_snapshot(out, destroyed, self.sim.winner())?;
        }
        out.flush()?;
        Ok(self.summary())
    }

    fn write_snapshot<W: Write>(
        &self,
        out: &mut W,
        destroyed: usize,
        winner: Option<Team>,
    ) -> Result<(), RunError> {
        let snapshot = Snapshot {
            tick: self.sim.get_tick(),
            teams: self.sim.statuses().to_vec(),
            destroyed,
            winner,
        };
        serde_json::to_writer(&mut *out, &snapshot)?;
        writeln!(out)?;
        Ok(())
    }

    /// Current result.
    #[must_use]
    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            ticks: self.sim.get_tick(),
            winner: self.sim.winner(),
            teams: self.sim.statuses().to_vec(),
            state_hash: self.sim.state_hash(),
        }
    }
}

/// Built-in open map with a radar and a turret per side.
#[must_use]
pub fn demo_map() -> MapData {
    let mut map = MapData::open(24, 24, 32.0);
    let marker = |name: &str, team: Team, x: u32, y: u32| MapObject {
        name: name.to_string(),
        team,
        x: x as f32 * 32.0,
        y: y as f32 * 32.0,
    };
    map.objects = vec![
        marker("radar", Team::Red, 2, 2),
        marker("turret", Team::Red, 4, 3),
        marker("radar", Team::Blue, 21, 21),
        marker("turret", Team::Blue, 19, 20),
    ];
    for y in 9..15 {
        map.set_impassable(12, y);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_ticks: u64, report_every: u64) -> RunConfig {
        RunConfig {
            max_ticks,
            report_every,
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_snapshots_are_json_lines() {
        let mut runner = MatchRunner::new(&demo_map(), config(50, 10)).unwrap();
        let mut out = Vec::new();
        let summary = runner.run(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let snapshots: Vec<Snapshot> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(snapshots.len(), 5);
        assert_eq!(snapshots[0].tick, 10);
        assert_eq!(snapshots[0].teams.len(), 2);
        assert_eq!(snapshots[0].teams[0].team, Team::Red);
        assert_eq!(summary.ticks, 50);
    }

    #[test]
    fn test_unaligned_tick_limit_still_ends_with_snapshot() {
        let mut runner = MatchRunner::new(&demo_map(), config(25, 10)).unwrap();
        let mut out = Vec::new();
        runner.run(&mut out).unwrap();

        let ticks: Vec<u64> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str::<Snapshot>(line).unwrap().tick)
            .collect();
        assert_eq!(ticks, vec![10, 20, 25]);
    }

    #[test]
    fn test_final_snapshot_only_when_not_reporting() {
        let mut runner = MatchRunner::new(&demo_map(), config(30, 0)).unwrap();
        let mut out = Vec::new();
        runner.run(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_player_team_is_not_ai_driven() {
        let run = RunConfig {
            player: Some(Team::Blue),
            ..config(10, 0)
        };
        let runner = MatchRunner::new(&demo_map(), run).unwrap();
        assert_eq!(runner.simulation().ai_teams(), vec![Team::Red]);
    }

    #[test]
    fn test_one_sided_map_is_decided_immediately() {
        let mut map = MapData::open(8, 8, 32.0);
        map.objects.push(MapObject {
            name: "radar".to_string(),
            team: Team::Red,
            x: 0.0,
            y: 0.0,
        });
        let mut runner = MatchRunner::new(&map, config(100, 0)).unwrap();
        let mut out = Vec::new();
        let summary = runner.run(&mut out).unwrap();
        assert_eq!(summary.winner, Some(Team::Red));
        assert_eq!(summary.ticks, 1);
    }

    #[test]
    fn test_same_seed_same_summary() {
        let run = || {
            let mut runner = MatchRunner::new(&demo_map(), config(200, 0)).unwrap();
            runner.run(&mut std::io::sink()).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_summary_score_lookup() {
        let runner = MatchRunner::new(&demo_map(), config(1, 0)).unwrap();
        let summary = runner.summary();
        assert_eq!(summary.score_of(Team::Red), 0);
        assert_eq!(summary.score_of(Team::Neutral), 0);
    }
}
