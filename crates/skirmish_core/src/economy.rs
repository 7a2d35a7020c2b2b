//! Territory, energy and score bookkeeping.
//!
//! On every economy tick the territory map is rebuilt from scratch: each
//! team-owned entity claims the square of tiles its range (or the default
//! sensor radius) covers. Build legality and the team AI read the territory
//! left by the previous economy tick, not one computed mid-tick.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::Entity;
use crate::config::MatchConfig;
use crate::factions::Team;
use crate::grid::{Cell, TileGrid, TilePos};
use crate::math::Vec2;
use crate::registry::Registry;
use crate::unit_kind::{Mobility, UnitKind};

/// Why a build request was refused. A refused request changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SpawnError {
    /// The tile is not in the requesting team's territory.
    #[error("tile {tile:?} is not owned by {team:?}")]
    NotOwned {
        /// Requesting team.
        team: Team,
        /// Requested tile.
        tile: TilePos,
    },
    /// Not enough energy for the kind's cost.
    #[error("{team:?} has {energy} energy, {cost} needed")]
    InsufficientEnergy {
        /// Requesting team.
        team: Team,
        /// Energy on hand.
        energy: i32,
        /// Price of the requested kind.
        cost: i32,
    },
    /// Something already stands on the build site.
    #[error("build site at {0:?} is blocked")]
    Blocked(TilePos),
    /// The pixel lies outside the map.
    #[error("({x}, {y}) is outside the map")]
    OutOfBounds {
        /// Pixel x.
        x: f32,
        /// Pixel y.
        y: f32,
    },
    /// No territory has been computed yet.
    #[error("territory not computed yet")]
    NotLoaded,
}

/// Energy and score of one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TeamEconomy {
    /// Current energy.
    pub energy: i32,
    /// Cap from the last economy tick.
    pub max_energy: i32,
    /// Points from destroying enemy entities.
    pub score: u32,
}

impl TeamEconomy {
    /// Economy with a starting bank and no cap yet.
    #[must_use]
    pub const fn new(energy: i32) -> Self {
        Self {
            energy,
            max_energy: 0,
            score: 0,
        }
    }

    /// Check if the team can afford a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: i32) -> bool {
        self.energy >= cost
    }

    /// Spend energy if available. Returns true if the transaction succeeded.
    pub fn spend(&mut self, cost: i32) -> bool {
        if self.can_afford(cost) {
            self.energy -= cost;
            true
        } else {
            false
        }
    }

    /// Add the per-tick increment, capped at `max_energy`.
    ///
    /// The result always lies in `[0, max_energy]`; a bank above a freshly
    /// lowered cap is clamped down.
    pub fn accrue(&mut self, increment: i32) {
        self.energy = (self.energy + increment).min(self.max_energy).max(0);
    }
}

/// Per-team numbers the UI shows every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStatus {
    /// Which team.
    pub team: Team,
    /// Points scored.
    pub score: u32,
    /// Current energy.
    pub energy: i32,
    /// Energy cap.
    pub max_energy: i32,
    /// Live entities owned by the team.
    pub units: usize,
    /// Tiles in the team's territory.
    pub territory: usize,
}

/// Match-wide economy state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Economy {
    red: TeamEconomy,
    blue: TeamEconomy,
    /// Territory from the last economy tick.
    territory: Option<TileGrid>,
}

impl Economy {
    /// Both teams start with `starting_energy`.
    #[must_use]
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            red: TeamEconomy::new(config.starting_energy),
            blue: TeamEconomy::new(config.starting_energy),
            territory: None,
        }
    }

    /// Economy of a playable team. Neutral has none.
    #[must_use]
    pub const fn team(&self, team: Team) -> Option<&TeamEconomy> {
        match team {
            Team::Red => Some(&self.red),
            Team::Blue => Some(&self.blue),
            Team::Neutral => None,
        }
    }

    /// Mutable economy of a playable team.
    pub fn team_mut(&mut self, team: Team) -> Option<&mut TeamEconomy> {
        match team {
            Team::Red => Some(&mut self.red),
            Team::Blue => Some(&mut self.blue),
            Team::Neutral => None,
        }
    }

    /// Current energy, 0 for Neutral.
    #[must_use]
    pub fn energy(&self, team: Team) -> i32 {
        self.team(team).map_or(0, |t| t.energy)
    }

    /// Territory from the last economy tick.
    #[must_use]
    pub const fn territory(&self) -> Option<&TileGrid> {
        self.territory.as_ref()
    }

    /// Owner of a tile in the last territory snapshot.
    #[must_use]
    pub fn owner_of(&self, tile: TilePos) -> Team {
        self.territory
            .as_ref()
            .and_then(|t| t.get(tile))
            .map_or(Team::Neutral, Cell::owner)
    }

    /// Economy tick: rebuild territory and energy caps, then accrue.
    pub fn tick(&mut self, registry: &mut Registry, config: &MatchConfig) {
        let Some(mut territory) = registry.copy_passable_map() else {
            return;
        };

        let mut red_max = 0;
        let mut blue_max = 0;
        for entity in registry.iter() {
            if !entity.team.is_playable() || entity.is_destroyed() {
                continue;
            }
            stamp_territory(&mut territory, entity, config.default_sensor_radius);
            if entity.kind.is_sensor() {
                match entity.team {
                    Team::Red => red_max += config.energy_per_sensor,
                    Team::Blue => blue_max += config.energy_per_sensor,
                    Team::Neutral => {}
                }
            }
        }

        self.red.max_energy = red_max;
        self.blue.max_energy = blue_max;
        self.red.accrue(config.energy_per_tick);
        self.blue.accrue(config.energy_per_tick);
        self.territory = Some(territory);

        tracing::trace!(
            red_energy = self.red.energy,
            blue_energy = self.blue.energy,
            red_max,
            blue_max,
            "economy tick"
        );
    }

    /// Check a build request against the last territory snapshot and the
    /// team's bank. Returns the tile the unit would be placed on.
    ///
    /// Nothing is charged here; see [`Economy::charge`].
    pub fn check_spawn(&self, team: Team, kind: UnitKind, at: Vec2) -> Result<TilePos, SpawnError> {
        let territory = self.territory.as_ref().ok_or(SpawnError::NotLoaded)?;
        let tile = territory.tile_of(at);
        if !territory.contains(tile) {
            return Err(SpawnError::OutOfBounds { x: at.x, y: at.y });
        }
        if territory.get(tile) != Some(Cell::Owned(team)) {
            return Err(SpawnError::NotOwned { team, tile });
        }
        let energy = self.energy(team);
        let cost = kind.cost();
        if energy < cost {
            return Err(SpawnError::InsufficientEnergy { team, energy, cost });
        }
        Ok(tile)
    }

    /// Deduct a kind's cost. Call only after [`Economy::check_spawn`].
    pub fn charge(&mut self, team: Team, kind: UnitKind) -> Result<(), SpawnError> {
        let cost = kind.cost();
        let bank = self.team_mut(team).ok_or(SpawnError::NotOwned {
            team,
            tile: TilePos::default(),
        })?;
        let energy = bank.energy;
        if bank.spend(cost) {
            Ok(())
        } else {
            Err(SpawnError::InsufficientEnergy { team, energy, cost })
        }
    }

    /// Credit the destroyer of `victim`. Returns who scored and how much.
    pub fn credit_destruction(&mut self, victim: &Entity, config: &MatchConfig) -> Option<(Team, u32)> {
        let scorer = victim.team.opponent()?;
        let points = destruction_points(victim.kind.mobility(), config);
        let bank = self.team_mut(scorer)?;
        bank.score += points;
        Some((scorer, points))
    }

    /// Status line for a team.
    #[must_use]
    pub fn status(&self, team: Team, registry: &Registry) -> TeamStatus {
        let bank = self.team(team).copied().unwrap_or_default();
        TeamStatus {
            team,
            score: bank.score,
            energy: bank.energy,
            max_energy: bank.max_energy,
            units: registry.iter().filter(|e| e.team == team).count(),
            territory: self.territory.as_ref().map_or(0, |t| t.owned_count(team)),
        }
    }
}

/// Points for destroying something with the given mobility.
#[must_use]
pub const fn destruction_points(mobility: Mobility, config: &MatchConfig) -> u32 {
    match mobility {
        Mobility::Fixed => config.score_fixed,
        Mobility::Rotating => config.score_rotating,
        Mobility::Mobile => config.score_mobile,
    }
}

/// Claim the square of tiles around `entity` for its team.
///
/// Impassable and occupied cells keep their marker; every open cell in the
/// square is overwritten, so later entities win overlaps.
fn stamp_territory(territory: &mut TileGrid, entity: &Entity, default_radius: f32) {
    let radius_px = if entity.weapon.is_some() {
        entity.range()
    } else {
        default_radius
    };
    let radius = (radius_px / territory.tile_width()).floor() as i32;
    let center = territory.shrunk_tile_of(entity.position);

    let max_x = territory.width() as i32 - 1;
    let max_y = territory.height() as i32 - 1;
    for y in (center.y - radius).max(0)..=(center.y + radius).min(max_y) {
        for x in (center.x - radius).max(0)..=(center.x + radius).min(max_x) {
            let tile = TilePos::new(x, y);
            if territory.get(tile).is_some_and(Cell::is_open) {
                territory.set(tile, Cell::Owned(entity.team));
            }
        }
    }
}
