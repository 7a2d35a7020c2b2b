//! Test fixtures and helpers.
//!
//! Pre-built maps and match setups for consistent testing. Larger setups
//! can be written as RON [`Scenario`]s:
//!
//! ```ron
//! Scenario(
//!     width: 12,
//!     height: 12,
//!     walls: [(5, 0), (5, 1), (5, 2)],
//!     units: [
//!         (kind: "tank_1", team: Red, tile: (0, 0)),
//!         (kind: "radar", team: Blue, tile: (10, 10)),
//!     ],
//! )
//! ```

use serde::{Deserialize, Serialize};
use skirmish_core::config::MatchConfig;
use skirmish_core::factions::Team;
use skirmish_core::grid::MapData;
use skirmish_core::math::Vec2;
use skirmish_core::simulation::{Simulation, StaticFootprints};
use skirmish_core::unit_kind::UnitKind;

/// Tile edge used by every fixture map.
pub const TILE: f32 = 32.0;

/// Pixel origin of a tile on a fixture map.
#[must_use]
pub fn tile(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32 * TILE, y as f32 * TILE)
}

/// Map with no impassable terrain.
#[must_use]
pub fn open_map(width: u32, height: u32) -> MapData {
    MapData::open(width, height, TILE)
}

/// Open map with a vertical wall at column `wall_x`, leaving a single gap
/// at row `gap_y`.
#[must_use]
pub fn walled_map(width: u32, height: u32, wall_x: u32, gap_y: u32) -> MapData {
    let mut map = open_map(width, height);
    for y in (0..height).filter(|y| *y != gap_y) {
        map.set_impassable(wall_x, y);
    }
    map
}

/// Simulation on `map` with default tuning and 32x32 footprints.
///
/// # Panics
///
/// Panics if the map is invalid.
#[must_use]
pub fn simulation_on(map: &MapData) -> Simulation {
    simulation_with(map, MatchConfig::default())
}

/// Simulation on `map` with custom tuning.
///
/// # Panics
///
/// Panics if the map is invalid.
#[must_use]
pub fn simulation_with(map: &MapData, config: MatchConfig) -> Simulation {
    let mut sim = Simulation::new(config, Box::new(StaticFootprints::new(TILE, TILE)));
    sim.attach_map(map).expect("fixture map should be valid");
    sim
}

/// Two bases facing off across an open 24x24 map, both driven by the
/// team AI. Used for determinism and benchmark runs.
#[must_use]
pub fn skirmish(seed: u64) -> Simulation {
    let config = MatchConfig {
        seed,
        ..MatchConfig::default()
    };
    let mut sim = simulation_with(&open_map(24, 24), config);
    sim.spawn(UnitKind::Radar, Team::Red, tile(2, 2), 0.0);
    sim.spawn(UnitKind::Turret, Team::Red, tile(4, 3), 0.0);
    sim.spawn(UnitKind::Radar, Team::Blue, tile(21, 21), 0.0);
    sim.spawn(UnitKind::Turret, Team::Blue, tile(19, 20), 0.0);
    sim.enable_team_ai(Team::Red);
    sim.enable_team_ai(Team::Blue);
    sim
}

/// One unit placement in a [`Scenario`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Unit name such as `turret` or `tank_2`.
    pub kind: String,
    /// Owner.
    pub team: Team,
    /// Tile the unit's origin sits on.
    pub tile: (i32, i32),
}

/// Declarative match setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Impassable tiles.
    #[serde(default)]
    pub walls: Vec<(u32, u32)>,
    /// Units to place.
    #[serde(default)]
    pub units: Vec<Placement>,
    /// Teams driven by the team AI.
    #[serde(default)]
    pub ai_teams: Vec<Team>,
    /// Tuning overrides.
    #[serde(default)]
    pub config: MatchConfig,
}

impl Scenario {
    /// Parse a scenario from RON.
    ///
    /// # Errors
    ///
    /// Returns the RON error for malformed input.
    pub fn from_ron(source: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(source)
    }

    /// The scenario's map.
    #[must_use]
    pub fn map(&self) -> MapData {
        let mut map = open_map(self.width, self.height);
        for (x, y) in &self.walls {
            map.set_impassable(*x, *y);
        }
        map
    }

    /// Build a ready-to-tick simulation.
    ///
    /// # Panics
    ///
    /// Panics on an unknown unit name.
    #[must_use]
    pub fn build(&self) -> Simulation {
        let mut sim = simulation_with(&self.map(), self.config.clone());
        for placement in &self.units {
            let kind = UnitKind::parse(&placement.kind).expect("scenario unit kind");
            sim.spawn(kind, placement.team, tile(placement.tile.0, placement.tile.1), 0.0);
        }
        for team in &self.ai_teams {
            sim.enable_team_ai(*team);
        }
        tracing::debug!(units = self.units.len(), "scenario built");
        sim
    }
}
