//! Entity data model.
//!
//! One struct carries the state shared by every kind (geometry, health,
//! capability flags, scheduling); the kind-specific parts live in
//! [`Weapon`] for attack-capable entities and in [`Brain`] for the AI state
//! each kind's decision loop keeps between calls.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::factions::Team;
use crate::grid::TilePos;
use crate::math::{angle_delta, clamp_turn, normalize_angle, Vec2};
use crate::pathfinding::Step;
use crate::schedule::Schedule;
use crate::unit_kind::{UnitKind, WeaponStats};

/// Hit point sentinel for entities that cannot be damaged.
pub const INDESTRUCTIBLE_HP: i32 = -2;

/// Registry slot identity.
///
/// The slot index is stable while the entity lives and is reused after it is
/// destroyed; the generation tells a reused slot apart from its previous
/// occupant so stale target references never resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EntityId {
    /// Slot index in the registry.
    pub slot: u32,
    /// Times the slot has been reused.
    pub generation: u32,
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot, self.generation)
    }
}

/// Visual size of an entity, resolved once from the sprite layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Width in pixels.
    pub w: f32,
    /// Height in pixels.
    pub h: f32,
}

impl Footprint {
    /// Create a footprint.
    #[must_use]
    pub const fn new(w: f32, h: f32) -> Self {
        Self { w, h }
    }
}

/// Capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Can change position.
    pub movable: bool,
    /// Can change facing.
    pub rotatable: bool,
    /// Can take damage.
    pub destructible: bool,
}

/// Weapon state of an attack-capable entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    /// Static weapon stats.
    pub stats: WeaponStats,
    /// First tick at which the weapon may fire again.
    pub ready_at: u64,
}

impl Weapon {
    /// Weapon ready to fire immediately.
    #[must_use]
    pub const fn new(stats: WeaponStats) -> Self {
        Self { stats, ready_at: 0 }
    }

    /// True when the fire-rate cooldown has elapsed.
    #[must_use]
    pub const fn is_ready(&self, now: u64) -> bool {
        now >= self.ready_at
    }
}

/// Mobile gun unit AI state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TankBrain {
    /// Current target.
    pub target: Option<EntityId>,
    /// Remaining path steps toward the target's tile; `None` when no path
    /// is held.
    pub path: Option<VecDeque<Step>>,
    /// Tile the current step is heading for.
    pub waypoint: Option<TilePos>,
    /// Consecutive movement attempts refused by the physics layer.
    pub blocked_moves: u32,
}

/// Stationary gun unit AI state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurretBrain {
    /// Current target.
    pub target: Option<EntityId>,
    /// Firing animation active.
    pub firing: bool,
}

/// Kind-specific decision state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Brain {
    /// Seek, path, engage, fire.
    Tank(TankBrain),
    /// Rotate and fire.
    Turret(TurretBrain),
    /// No decisions.
    Passive,
}

impl TankBrain {
    /// Forget the target and the path, forcing a fresh seek.
    pub fn abandon(&mut self) {
        self.target = None;
        self.path = None;
        self.waypoint = None;
        self.blocked_moves = 0;
    }
}

impl Brain {
    /// Target the brain is tracking, if any.
    #[must_use]
    pub fn target(&self) -> Option<EntityId> {
        match self {
            Self::Tank(brain) => brain.target,
            Self::Turret(brain) => brain.target,
            Self::Passive => None,
        }
    }
}

/// Result of applying damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Entity is not destructible or was already destroyed.
    Ignored,
    /// Hit points dropped but the entity survives.
    Damaged,
    /// This hit took hit points to zero or below.
    Destroyed,
}

/// A unit or structure on the battlefield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Registry slot identity, assigned on insertion.
    pub id: EntityId,
    /// What this entity is.
    pub kind: UnitKind,
    /// Owning team.
    pub team: Team,
    /// Top-left corner in pixels.
    pub position: Vec2,
    /// Visual size; `None` until the sprite layer has it.
    pub footprint: Option<Footprint>,
    /// Facing in degrees, `(-180, 180]`.
    pub angle: f32,
    /// Current hit points.
    pub hp: i32,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Pixels per tick.
    pub speed: f32,
    /// Degrees per tick, 0 for unlimited.
    pub max_rotation: f32,
    /// Capability flags.
    pub caps: Capabilities,
    /// Energy cost to build.
    pub cost: i32,
    /// Weapon, for attack-capable kinds.
    pub weapon: Option<Weapon>,
    /// Pending decision, if any.
    pub schedule: Schedule,
    /// Decision state.
    pub brain: Brain,
}

impl Entity {
    /// Create an entity of `kind` from its static stats.
    ///
    /// The id is a placeholder until the registry assigns a slot.
    #[must_use]
    pub fn new(kind: UnitKind, team: Team, position: Vec2, angle: f32) -> Self {
        let stats = kind.stats();
        let (hp, max_hp) = if stats.destructible {
            (stats.max_hp, stats.max_hp)
        } else {
            (INDESTRUCTIBLE_HP, INDESTRUCTIBLE_HP)
        };
        let brain = match kind {
            UnitKind::Tank(_) => Brain::Tank(TankBrain::default()),
            UnitKind::Turret => Brain::Turret(TurretBrain::default()),
            UnitKind::Radar => Brain::Passive,
        };

        Self {
            id: EntityId::default(),
            kind,
            team,
            position,
            footprint: None,
            angle: normalize_angle(angle),
            hp,
            max_hp,
            speed: stats.speed,
            max_rotation: stats.max_rotation,
            caps: Capabilities {
                movable: stats.movable,
                rotatable: stats.rotatable,
                destructible: stats.destructible,
            },
            cost: stats.cost,
            weapon: stats.weapon.map(Weapon::new),
            schedule: Schedule::Idle,
            brain,
        }
    }

    /// Builder-style footprint assignment.
    #[must_use]
    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = Some(footprint);
        self
    }

    /// True once the footprint is known.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.footprint.is_some()
    }

    /// Footprint width, 0 until loaded.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.footprint.map_or(0.0, |f| f.w)
    }

    /// Footprint height, 0 until loaded.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.footprint.map_or(0.0, |f| f.h)
    }

    /// Center point for a hypothetical top-left position.
    #[must_use]
    pub fn center_at(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            position.x + self.width() / 2.0,
            position.y + self.height() / 2.0,
        )
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.center_at(self.position)
    }

    /// True for destructible entities at or below zero hit points.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.caps.destructible && self.hp <= 0
    }

    /// True for entities that need decisions.
    #[must_use]
    pub const fn has_ai(&self) -> bool {
        !matches!(self.brain, Brain::Passive)
    }

    /// Firing range, 0 for unarmed entities.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.weapon.map_or(0.0, |w| w.stats.range)
    }

    /// Distance from this entity's center to a point.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.center().distance(point)
    }

    /// Signed turn from the current facing toward a point.
    #[must_use]
    pub fn angle_to(&self, point: Vec2) -> f32 {
        angle_delta(self.angle, self.center().heading_to(point))
    }

    /// Turn by up to `max_rotation` toward `delta`; returns the applied turn.
    pub fn rotate(&mut self, delta: f32) -> f32 {
        if !self.caps.rotatable {
            return 0.0;
        }
        let applied = clamp_turn(delta, self.max_rotation);
        self.angle = normalize_angle(self.angle + applied);
        applied
    }

    /// Where shots leave the gun: the mount offset rotated with the facing
    /// about the footprint center.
    #[must_use]
    pub fn gun_origin(&self) -> Vec2 {
        let center = self.center();
        match self.weapon {
            Some(weapon) => {
                let local = Vec2::new(
                    weapon.stats.gun_mount.x - self.width() / 2.0,
                    weapon.stats.gun_mount.y - self.height() / 2.0,
                );
                center + local.rotated(self.angle)
            }
            None => center,
        }
    }

    /// Apply damage. Reports `Destroyed` only for the hit that crosses zero.
    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        if !self.caps.destructible || self.is_destroyed() {
            return DamageOutcome::Ignored;
        }
        self.hp = (self.hp - amount.max(0)).min(self.max_hp);
        if self.hp <= 0 {
            self.hp = 0;
            DamageOutcome::Destroyed
        } else {
            DamageOutcome::Damaged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit_kind::TankVariant;

    const EPS: f32 = 1e-3;

    fn turret_at(x: f32, y: f32) -> Entity {
        Entity::new(UnitKind::Turret, Team::Red, Vec2::new(x, y), 0.0)
            .with_footprint(Footprint::new(32.0, 32.0))
    }

    #[test]
    fn test_new_entity_uses_kind_stats() {
        let tank = Entity::new(
            UnitKind::Tank(TankVariant::Heavy),
            Team::Blue,
            Vec2::ZERO,
            0.0,
        );
        let stats = UnitKind::Tank(TankVariant::Heavy).stats();
        assert_eq!(tank.hp, stats.max_hp);
        assert_eq!(tank.max_hp, stats.max_hp);
        assert!(tank.caps.movable && tank.caps.rotatable && tank.caps.destructible);
        assert!(matches!(tank.brain, Brain::Tank(_)));
        assert!(!tank.is_loaded());
    }

    #[test]
    fn test_radar_is_passive_and_unarmed() {
        let radar = Entity::new(UnitKind::Radar, Team::Red, Vec2::ZERO, 0.0);
        assert!(!radar.has_ai());
        assert!(radar.weapon.is_none());
        assert_eq!(radar.range(), 0.0);
        assert!(!radar.caps.movable && !radar.caps.rotatable);
    }

    #[test]
    fn test_center_uses_footprint() {
        let turret = turret_at(64.0, 32.0);
        assert_eq!(turret.center(), Vec2::new(80.0, 48.0));
    }

    #[test]
    fn test_damage_reports_destruction_once() {
        let mut turret = turret_at(0.0, 0.0);
        assert_eq!(turret.take_damage(60), DamageOutcome::Damaged);
        assert_eq!(turret.hp, 40);
        assert_eq!(turret.take_damage(60), DamageOutcome::Destroyed);
        assert_eq!(turret.hp, 0);
        assert!(turret.is_destroyed());
        assert_eq!(turret.take_damage(10), DamageOutcome::Ignored);
        assert_eq!(turret.hp, 0);
    }

    #[test]
    fn test_non_destructible_never_takes_damage() {
        let mut turret = turret_at(0.0, 0.0);
        turret.caps.destructible = false;
        turret.hp = INDESTRUCTIBLE_HP;
        assert_eq!(turret.take_damage(500), DamageOutcome::Ignored);
        assert_eq!(turret.hp, INDESTRUCTIBLE_HP);
        assert!(!turret.is_destroyed());
    }

    #[test]
    fn test_rotate_is_clamped() {
        let mut turret = turret_at(0.0, 0.0);
        assert!((turret.rotate(90.0) - 20.0).abs() < EPS);
        assert!((turret.angle - 20.0).abs() < EPS);
        assert!((turret.rotate(-5.0) + 5.0).abs() < EPS);
        assert!((turret.angle - 15.0).abs() < EPS);
    }

    #[test]
    fn test_angle_to_target() {
        let turret = turret_at(0.0, 0.0);
        // Target straight below the center
        let below = Vec2::new(16.0, 200.0);
        assert!((turret.angle_to(below) - 90.0).abs() < EPS);
    }

    #[test]
    fn test_gun_origin_rotates_with_facing() {
        let mut turret = turret_at(0.0, 0.0);
        // Mount (29, 16) is 13px ahead of center when facing +x
        let origin = turret.gun_origin();
        assert!((origin.x - 29.0).abs() < EPS);
        assert!((origin.y - 16.0).abs() < EPS);

        turret.max_rotation = 0.0;
        turret.rotate(90.0);
        let origin = turret.gun_origin();
        assert!((origin.x - 16.0).abs() < EPS);
        assert!((origin.y - 29.0).abs() < EPS);
    }
}
