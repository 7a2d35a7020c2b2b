//! # Skirmish Core
//!
//! Simulation and decision engine for a two-team tactical battle on a tile
//! grid.
//!
//! This crate contains only the match logic:
//! - No rendering
//! - No file formats beyond RON configuration
//! - No wall-clock time (everything is counted in ticks)
//! - No system randomness (the team AI draws from a seeded RNG)
//!
//! Visuals and sound are reported as [`simulation::GameEvent`]s; footprints
//! come from a [`simulation::SpriteCatalog`].
//!
//! ## Crate Structure
//!
//! - [`grid`] - Tile grid, map description and pixel/tile conversion
//! - [`pathfinding`] - Wavefront shortest-path search
//! - [`components`] - Entity data model
//! - [`unit_kind`] - Unit kinds and their stat tables
//! - [`registry`] - Entity arena and passability checks
//! - [`schedule`] - Per-entity decision scheduling
//! - [`ai`] - Unit and team decision logic
//! - [`economy`] - Territory, energy and score
//! - [`simulation`] - The tick loop tying it together

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod components;
pub mod config;
pub mod economy;
pub mod error;
pub mod factions;
pub mod grid;
pub mod math;
pub mod pathfinding;
pub mod registry;
pub mod schedule;
pub mod simulation;
pub mod unit_kind;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiAction, FireReport, SpawnOrder, TeamAi};
    pub use crate::components::*;
    pub use crate::config::MatchConfig;
    pub use crate::economy::{Economy, SpawnError, TeamEconomy, TeamStatus};
    pub use crate::error::{GameError, Result};
    pub use crate::factions::Team;
    pub use crate::grid::{Cell, MapData, MapObject, TileGrid, TilePos};
    pub use crate::math::Vec2;
    pub use crate::pathfinding::{find_path, Step};
    pub use crate::registry::Registry;
    pub use crate::schedule::{Interval, Schedule};
    pub use crate::simulation::{
        BuildCommand, GameEvent, Simulation, SoundCue, SpriteCatalog, StaticFootprints,
        TickEvents,
    };
    pub use crate::unit_kind::{Mobility, TankVariant, UnitKind, UnitStats, WeaponStats};
}
