//! Unit and team decision logic.
//!
//! A unit decision runs when its [`Schedule`](crate::schedule::Schedule)
//! fires. Each decision does one thing (seek, rotate, move or fire), then
//! asks for the next decision with the delay that fits what it did. Damage
//! is not applied here: fire decisions come back as [`FireReport`]s and the
//! simulation resolves them, so destruction happens in one place.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{Brain, Entity, EntityId, TankBrain, TurretBrain};
use crate::config::MatchConfig;
use crate::factions::Team;
use crate::grid::{Cell, TileGrid, TilePos};
use crate::math::{angle_delta, Vec2};
use crate::pathfinding::find_path;
use crate::registry::Registry;
use crate::schedule::Interval;
use crate::unit_kind::{TankVariant, UnitKind};

/// Facing error below which a unit counts as aligned with its path step.
const ALIGNED: f32 = 0.5;

/// Distance below which a unit counts as standing on its waypoint.
const ARRIVED: f32 = 0.01;

/// A shot resolved by a decision, to be applied by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireReport {
    /// Who fired.
    pub shooter: EntityId,
    /// Shooter's team, for the beam color.
    pub team: Team,
    /// Who gets hit.
    pub target: EntityId,
    /// Damage to apply.
    pub damage: i32,
    /// Gun origin in pixels.
    pub origin: Vec2,
    /// Target center in pixels.
    pub impact: Vec2,
}

/// Observable effect of one decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AiAction {
    /// Position changed.
    Moved {
        /// Unit that moved.
        id: EntityId,
        /// New top-left corner.
        position: Vec2,
    },
    /// Facing changed.
    Rotated {
        /// Unit that turned.
        id: EntityId,
        /// New facing in degrees.
        angle: f32,
    },
    /// A new target was picked.
    TargetAcquired {
        /// Unit that picked it.
        id: EntityId,
        /// The target.
        target: EntityId,
    },
    /// The target was given up.
    TargetDropped {
        /// Unit that dropped it.
        id: EntityId,
    },
    /// A shot was fired.
    Fired(FireReport),
}

/// Run one decision for `id` and schedule the next one.
///
/// Destroyed or unknown entities get no further decision. Units whose
/// footprint or map is not available yet defer.
pub fn make_decision(
    registry: &mut Registry,
    id: EntityId,
    now: u64,
    config: &MatchConfig,
) -> Vec<AiAction> {
    let mut actions = Vec::new();
    let Some(entity) = registry.get(id) else {
        return actions;
    };

    if entity.is_destroyed() {
        if let Some(entity) = registry.get_mut(id) {
            entity.schedule.cancel();
        }
        return actions;
    }

    let delay = if !entity.is_loaded() || !registry.is_map_loaded() {
        config.decision_delay
    } else {
        match entity.brain.clone() {
            Brain::Tank(mut brain) => {
                let delay = tank_decision(registry, id, &mut brain, now, config, &mut actions);
                store_brain(registry, id, Brain::Tank(brain));
                delay
            }
            Brain::Turret(mut brain) => {
                let delay = turret_decision(registry, id, &mut brain, now, config, &mut actions);
                store_brain(registry, id, Brain::Turret(brain));
                delay
            }
            Brain::Passive => return actions,
        }
    };

    if let Some(entity) = registry.get_mut(id) {
        entity.schedule.delayed_call(now, delay);
    }
    actions
}

fn store_brain(registry: &mut Registry, id: EntityId, brain: Brain) {
    if let Some(entity) = registry.get_mut(id) {
        entity.brain = brain;
    }
}

/// Nearest living enemy of `me` by center distance, optionally limited to
/// `radius`. Ties go to the earlier registry slot.
#[must_use]
pub fn nearest_enemy(registry: &Registry, me: &Entity, radius: Option<f32>) -> Option<EntityId> {
    let center = me.center();
    let limit_sq = radius.map(|r| r * r);
    let mut best: Option<(f32, EntityId)> = None;

    for other in registry.iter() {
        if !me.team.is_enemy_of(other.team) || other.is_destroyed() {
            continue;
        }
        let dist_sq = other.center().distance_squared(center);
        if limit_sq.is_some_and(|limit| dist_sq > limit) {
            continue;
        }
        if best.map_or(true, |(d, _)| dist_sq < d) {
            best = Some((dist_sq, other.id));
        }
    }
    best.map(|(_, id)| id)
}

/// Fire at `target` if the weapon is ready. Returns the shot and the delay
/// until the next decision.
fn fire(registry: &mut Registry, id: EntityId, target: EntityId, now: u64) -> (Option<FireReport>, u64) {
    let Some(impact) = registry.get(target).map(Entity::center) else {
        return (None, 1);
    };
    let Some(shooter) = registry.get_mut(id) else {
        return (None, 1);
    };
    let origin = shooter.gun_origin();
    let team = shooter.team;
    let Some(weapon) = shooter.weapon.as_mut() else {
        return (None, 1);
    };

    if !weapon.is_ready(now) {
        return (None, weapon.ready_at - now);
    }

    weapon.ready_at = now + weapon.stats.fire_rate;
    let report = FireReport {
        shooter: id,
        team,
        target,
        damage: weapon.stats.damage,
        origin,
        impact,
    };
    (Some(report), weapon.stats.fire_rate.max(1))
}

/// Mobile gun unit: seek, path, engage, fire.
fn tank_decision(
    registry: &mut Registry,
    id: EntityId,
    brain: &mut TankBrain,
    now: u64,
    config: &MatchConfig,
    actions: &mut Vec<AiAction>,
) -> u64 {
    let target = brain.target.filter(|t| registry.is_alive(*t));
    let Some(target) = target.filter(|_| brain.path.is_some()) else {
        seek(registry, id, brain, actions);
        return config.decision_delay;
    };

    if in_range(registry, id, target) {
        let (report, delay) = fire(registry, id, target, now);
        if let Some(report) = report {
            actions.push(AiAction::Fired(report));
        }
        return delay;
    }

    let Some(step) = brain.path.as_ref().and_then(|p| p.front().copied()) else {
        // Path used up but the target moved out of range
        brain.path = None;
        return config.decision_delay;
    };

    let Some((angle, position, speed)) = registry.get(id).map(|e| (e.angle, e.position, e.speed))
    else {
        return config.decision_delay;
    };
    let turn = angle_delta(angle, step.facing());
    if turn.abs() > ALIGNED {
        if let Some(me) = registry.get_mut(id) {
            me.rotate(turn);
            actions.push(AiAction::Rotated { id, angle: me.angle });
        }
        return config.decision_delay;
    }

    let Some(grid) = registry.terrain() else {
        return config.decision_delay;
    };
    let waypoint = *brain
        .waypoint
        .get_or_insert_with(|| grid.shrunk_tile_of(position).offset(step.dx, step.dy));
    let to = grid.tile_origin(waypoint) - position;
    let remaining = to.length();

    if remaining > ARRIVED {
        let delta = if remaining <= speed {
            to
        } else {
            to.scaled(speed / remaining)
        };
        if !registry.try_move(id, delta) {
            brain.blocked_moves += 1;
            if brain.blocked_moves >= config.blocked_move_limit {
                tracing::debug!(%id, blocked = brain.blocked_moves, "giving up on blocked path");
                brain.abandon();
                actions.push(AiAction::TargetDropped { id });
            }
            return config.decision_delay;
        }
        brain.blocked_moves = 0;
        actions.push(AiAction::Moved {
            id,
            position: position + delta,
        });
        if remaining > speed {
            return config.decision_delay;
        }
    }

    if let Some(path) = brain.path.as_mut() {
        path.pop_front();
    }
    brain.waypoint = None;

    // Arrived on the tile: the shot can go out this same decision
    if in_range(registry, id, target) {
        let (report, delay) = fire(registry, id, target, now);
        if let Some(report) = report {
            actions.push(AiAction::Fired(report));
            return delay;
        }
    }
    config.decision_delay
}

fn in_range(registry: &Registry, id: EntityId, target: EntityId) -> bool {
    match (registry.get(id), registry.get(target)) {
        (Some(me), Some(other)) => me.distance_to(other.center()) <= me.range(),
        _ => false,
    }
}

/// Pick the nearest enemy and route to its tile. No path drops the target.
fn seek(registry: &mut Registry, id: EntityId, brain: &mut TankBrain, actions: &mut Vec<AiAction>) {
    brain.abandon();
    let Some(me) = registry.get(id) else {
        return;
    };
    let Some(enemy) = nearest_enemy(registry, me, None) else {
        return;
    };
    let my_position = me.position;
    let Some(enemy_position) = registry.get(enemy).map(|e| e.position) else {
        return;
    };
    let Some(mut snapshot) = registry.copy_passable_map() else {
        return;
    };

    let source = snapshot.shrunk_tile_of(my_position);
    let goal = snapshot.shrunk_tile_of(enemy_position);
    // Structures sit on Occupied cells; the goal itself has to be reachable
    if snapshot.get(goal) == Some(Cell::Occupied) {
        snapshot.set(goal, Cell::Passable);
    }

    match find_path(&snapshot, source, goal) {
        Some(steps) => {
            tracing::debug!(%id, %enemy, steps = steps.len(), "target acquired");
            brain.target = Some(enemy);
            brain.path = Some(steps.into());
            actions.push(AiAction::TargetAcquired { id, target: enemy });
        }
        None => {
            tracing::debug!(%id, %enemy, "no path to target");
        }
    }
}

/// Stationary gun unit: acquire, aim, fire.
fn turret_decision(
    registry: &mut Registry,
    id: EntityId,
    brain: &mut TurretBrain,
    now: u64,
    config: &MatchConfig,
    actions: &mut Vec<AiAction>,
) -> u64 {
    let Some(target) = brain.target.filter(|t| registry.is_alive(*t)) else {
        brain.firing = false;
        brain.target = registry
            .get(id)
            .and_then(|me| nearest_enemy(registry, me, Some(me.range())));
        if let Some(target) = brain.target {
            actions.push(AiAction::TargetAcquired { id, target });
        }
        return config.decision_delay;
    };

    let (Some(me), Some(center)) = (registry.get(id), registry.get(target).map(Entity::center)) else {
        return config.decision_delay;
    };
    let turn = me.angle_to(center);
    let out_of_range = me.distance_to(center) > me.range();

    if turn.abs() > config.aim_tolerance {
        if let Some(me) = registry.get_mut(id) {
            me.rotate(turn);
            actions.push(AiAction::Rotated { id, angle: me.angle });
        }
        config.decision_delay
    } else if out_of_range {
        tracing::debug!(%id, %target, "target left range");
        brain.target = None;
        brain.firing = false;
        actions.push(AiAction::TargetDropped { id });
        config.decision_delay
    } else {
        brain.firing = true;
        let (report, delay) = fire(registry, id, target, now);
        if let Some(report) = report {
            actions.push(AiAction::Fired(report));
        }
        delay
    }
}

/// Energy at which the team AI starts considering spawns.
pub const SPAWN_LOW: i32 = 30;
/// Energy below which only light spawning happens.
pub const SPAWN_MID: i32 = 75;
/// Energy at which the team AI always spawns.
pub const SPAWN_HIGH: i32 = 100;

/// Percent chance per team-AI decision of attempting a spawn.
#[must_use]
pub const fn spawn_chance(energy: i32) -> u32 {
    if energy < SPAWN_LOW {
        0
    } else if energy < SPAWN_MID {
        6
    } else if energy < SPAWN_HIGH {
        30
    } else {
        100
    }
}

/// Kind to spawn at a given energy level.
///
/// Low energy only buys tanks, the middle band splits tanks and turrets,
/// and a full bank adds radars. Tank variants are uniform.
pub fn choose_kind<R: Rng + ?Sized>(energy: i32, rng: &mut R) -> UnitKind {
    let tank = |rng: &mut R| {
        let variant = TankVariant::ALL[rng.gen_range(0..TankVariant::ALL.len())];
        UnitKind::Tank(variant)
    };

    if energy < SPAWN_MID {
        tank(rng)
    } else if energy < SPAWN_HIGH {
        if rng.gen_bool(0.5) {
            tank(rng)
        } else {
            UnitKind::Turret
        }
    } else {
        match rng.gen_range(0..3) {
            0 => tank(rng),
            1 => UnitKind::Turret,
            _ => UnitKind::Radar,
        }
    }
}

/// Uniformly random tile owned by `team` on a territory map.
pub fn random_owned_tile<R: Rng + ?Sized>(territory: &TileGrid, team: Team, rng: &mut R) -> Option<TilePos> {
    let owned = territory.owned_count(team);
    if owned == 0 {
        return None;
    }
    let chosen = rng.gen_range(0..owned);
    territory
        .iter()
        .filter(|(_, cell)| *cell == Cell::Owned(team))
        .nth(chosen)
        .map(|(pos, _)| pos)
}

/// A spawn the team AI wants to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnOrder {
    /// Team that pays and owns the unit.
    pub team: Team,
    /// What to build.
    pub kind: UnitKind,
    /// Where to build it.
    pub tile: TilePos,
}

/// Per-team spawn decisions on a fixed interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamAi {
    team: Team,
    timer: Interval,
}

impl TeamAi {
    /// Team AI whose first decision comes one period after `start`.
    #[must_use]
    pub fn new(team: Team, period: u64, start: u64) -> Self {
        Self {
            team,
            timer: Interval::new(period, start),
        }
    }

    /// Team this AI plays for.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Decide whether to spawn this tick.
    ///
    /// Reads the territory snapshot from the last economy tick.
    pub fn poll<R: Rng + ?Sized>(
        &mut self,
        now: u64,
        energy: i32,
        territory: &TileGrid,
        rng: &mut R,
    ) -> Option<SpawnOrder> {
        if !self.timer.tick(now) {
            return None;
        }
        let roll = rng.gen_range(0..100);
        if roll >= spawn_chance(energy) {
            return None;
        }
        let tile = random_owned_tile(territory, self.team, rng)?;
        let kind = choose_kind(energy, rng);
        tracing::debug!(team = self.team.short_name(), %kind, ?tile, energy, "team AI spawn");
        Some(SpawnOrder {
            team: self.team,
            kind,
            tile,
        })
    }
}
