//! Unit kinds and their static stat tables.
//!
//! The set of kinds is closed: a mobile gun unit in four variants, a
//! stationary gun unit, and a passive sensor structure. Each kind maps to a
//! fixed [`UnitStats`] row; nothing here is loaded at runtime.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::Vec2;

/// Mobile gun unit variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TankVariant {
    /// Fast and fragile.
    Light,
    /// Balanced.
    Medium,
    /// Slow, tough, hits hard.
    Heavy,
    /// Very slow, longest reach of any tank.
    Siege,
}

impl TankVariant {
    /// All variants in sub-type order.
    pub const ALL: [Self; 4] = [Self::Light, Self::Medium, Self::Heavy, Self::Siege];

    /// Sub-type number, 1 through 4.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Light => 1,
            Self::Medium => 2,
            Self::Heavy => 3,
            Self::Siege => 4,
        }
    }

    /// Variant for a sub-type number.
    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Light),
            2 => Some(Self::Medium),
            3 => Some(Self::Heavy),
            4 => Some(Self::Siege),
            _ => None,
        }
    }
}

/// Everything that can be built or placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Mobile gun unit.
    Tank(TankVariant),
    /// Stationary gun unit.
    Turret,
    /// Passive sensor structure.
    Radar,
}

/// How an entity gets around; drives destruction scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mobility {
    /// Neither moves nor rotates.
    Fixed,
    /// Rotates in place.
    Rotating,
    /// Drives around.
    Mobile,
}

/// Weapon stats of an attack-capable kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    /// Firing range in pixels, center to center.
    pub range: f32,
    /// Damage per shot.
    pub damage: i32,
    /// Ticks between shots.
    pub fire_rate: u64,
    /// Gun mount relative to the footprint's top-left corner, for a unit
    /// facing 0° (+x).
    pub gun_mount: Vec2,
}

/// Static stats for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Starting and maximum hit points.
    pub max_hp: i32,
    /// Pixels per tick.
    pub speed: f32,
    /// Degrees per tick, 0 for unlimited.
    pub max_rotation: f32,
    /// Can drive.
    pub movable: bool,
    /// Can turn.
    pub rotatable: bool,
    /// Can be damaged.
    pub destructible: bool,
    /// Energy cost to build.
    pub cost: i32,
    /// Weapon, `None` for passive structures.
    pub weapon: Option<WeaponStats>,
}

const fn tank(max_hp: i32, speed: f32, max_rotation: f32, weapon: WeaponStats, cost: i32) -> UnitStats {
    UnitStats {
        max_hp,
        speed,
        max_rotation,
        movable: true,
        rotatable: true,
        destructible: true,
        cost,
        weapon: Some(weapon),
    }
}

const TANK_MOUNT: Vec2 = Vec2::new(30.0, 16.0);

/// Tank rows indexed by `TankVariant::number() - 1`.
static TANK_STATS: [UnitStats; 4] = [
    tank(
        60,
        4.0,
        30.0,
        WeaponStats {
            range: 96.0,
            damage: 3,
            fire_rate: 4,
            gun_mount: TANK_MOUNT,
        },
        30,
    ),
    tank(
        90,
        3.0,
        20.0,
        WeaponStats {
            range: 128.0,
            damage: 5,
            fire_rate: 5,
            gun_mount: TANK_MOUNT,
        },
        45,
    ),
    tank(
        140,
        2.0,
        15.0,
        WeaponStats {
            range: 160.0,
            damage: 8,
            fire_rate: 7,
            gun_mount: TANK_MOUNT,
        },
        70,
    ),
    tank(
        100,
        1.5,
        10.0,
        WeaponStats {
            range: 192.0,
            damage: 12,
            fire_rate: 10,
            gun_mount: TANK_MOUNT,
        },
        90,
    ),
];

static TURRET_STATS: UnitStats = UnitStats {
    max_hp: 100,
    speed: 0.0,
    max_rotation: 20.0,
    movable: false,
    rotatable: true,
    destructible: true,
    cost: 50,
    weapon: Some(WeaponStats {
        range: 200.0,
        damage: 5,
        fire_rate: 3,
        gun_mount: Vec2::new(29.0, 16.0),
    }),
};

static RADAR_STATS: UnitStats = UnitStats {
    max_hp: 150,
    speed: 0.0,
    max_rotation: 0.0,
    movable: false,
    rotatable: false,
    destructible: true,
    cost: 100,
    weapon: None,
};

impl UnitKind {
    /// Every buildable kind.
    pub const ALL: [Self; 6] = [
        Self::Tank(TankVariant::Light),
        Self::Tank(TankVariant::Medium),
        Self::Tank(TankVariant::Heavy),
        Self::Tank(TankVariant::Siege),
        Self::Turret,
        Self::Radar,
    ];

    /// Static stat row.
    #[must_use]
    pub fn stats(self) -> &'static UnitStats {
        match self {
            Self::Tank(variant) => &TANK_STATS[(variant.number() - 1) as usize],
            Self::Turret => &TURRET_STATS,
            Self::Radar => &RADAR_STATS,
        }
    }

    /// Energy cost to build.
    #[must_use]
    pub fn cost(self) -> i32 {
        self.stats().cost
    }

    /// Mobility profile.
    #[must_use]
    pub fn mobility(self) -> Mobility {
        let stats = self.stats();
        if stats.movable {
            Mobility::Mobile
        } else if stats.rotatable {
            Mobility::Rotating
        } else {
            Mobility::Fixed
        }
    }

    /// True for the passive sensor structure.
    #[must_use]
    pub const fn is_sensor(self) -> bool {
        matches!(self, Self::Radar)
    }

    /// Name used by map markers and the command line, e.g. `tank_2`.
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::Tank(variant) => format!("tank_{}", variant.number()),
            Self::Turret => "turret".to_string(),
            Self::Radar => "radar".to_string(),
        }
    }

    /// Parse a marker or command name. A bare `tank` means the light variant.
    pub fn parse(name: &str) -> Result<Self> {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "turret" => Ok(Self::Turret),
            "radar" => Ok(Self::Radar),
            "tank" => Ok(Self::Tank(TankVariant::Light)),
            other => other
                .strip_prefix("tank_")
                .and_then(|n| n.parse::<u8>().ok())
                .and_then(TankVariant::from_number)
                .map(Self::Tank)
                .ok_or_else(|| GameError::UnknownUnitKind(name.to_string())),
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tank_variants_are_distinct() {
        let rows: Vec<_> = TankVariant::ALL
            .iter()
            .map(|v| UnitKind::Tank(*v).stats())
            .collect();
        for (i, a) in rows.iter().enumerate() {
            for b in &rows[i + 1..] {
                assert_ne!(a.speed, b.speed);
                assert_ne!(a.max_hp, b.max_hp);
                assert_ne!(a.cost, b.cost);
                assert_ne!(a.weapon.unwrap().range, b.weapon.unwrap().range);
                assert_ne!(a.weapon.unwrap().damage, b.weapon.unwrap().damage);
            }
        }
    }

    #[test]
    fn test_mobility_profiles() {
        assert_eq!(UnitKind::Radar.mobility(), Mobility::Fixed);
        assert_eq!(UnitKind::Turret.mobility(), Mobility::Rotating);
        assert_eq!(
            UnitKind::Tank(TankVariant::Heavy).mobility(),
            Mobility::Mobile
        );
    }

    #[test]
    fn test_turret_outranges_every_tank_and_radar_is_unarmed() {
        let turret = UnitKind::Turret.stats().weapon.unwrap();
        for variant in TankVariant::ALL {
            let tank = UnitKind::Tank(variant).stats().weapon.unwrap();
            assert!(turret.range > tank.range, "{variant:?} reaches past turrets");
        }
        assert!(UnitKind::Radar.stats().weapon.is_none());
    }

    #[test]
    fn test_parse_names() {
        for kind in UnitKind::ALL {
            assert_eq!(UnitKind::parse(&kind.name()).unwrap(), kind);
        }
        assert_eq!(
            UnitKind::parse("tank").unwrap(),
            UnitKind::Tank(TankVariant::Light)
        );
        assert!(matches!(
            UnitKind::parse("tank_9"),
            Err(GameError::UnknownUnitKind(_))
        ));
        assert!(UnitKind::parse("bunker").is_err());
    }
}
