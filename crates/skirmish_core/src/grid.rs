//! Tile grid and static map description.
//!
//! The grid is the physics layer's view of the map: one [`Cell`] per tile,
//! fixed dimensions for the whole match. The static passability grid is built
//! once from [`MapData`]; live snapshots and territory maps are copies of it
//! with overlays stamped in.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::factions::Team;
use crate::math::Vec2;

/// Contents of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Terrain nothing can cross.
    Impassable,
    /// Open terrain.
    #[default]
    Passable,
    /// Open terrain covered by a stationary destructible structure.
    Occupied,
    /// Open terrain claimed by a team (territory maps only).
    Owned(Team),
}

impl Cell {
    /// True when a path may run through this cell.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Passable | Self::Owned(_))
    }

    /// Team that controls this cell, `Neutral` when unclaimed.
    #[must_use]
    pub const fn owner(self) -> Team {
        match self {
            Self::Owned(team) => team,
            _ => Team::Neutral,
        }
    }
}

/// Integer tile coordinates. May be negative or past the edge while
/// exploring neighbors; use [`TileGrid::contains`] before indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TilePos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TilePos {
    /// Create a tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate offset by a step.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Manhattan distance, a lower bound on any 4-connected path length.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Fixed-size grid of cells indexed by `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_width: f32,
    tile_height: f32,
    /// Row-major cell storage.
    cells: Vec<Cell>,
}

impl TileGrid {
    /// Create a grid with every cell set to `fill`.
    ///
    /// # Panics
    ///
    /// Panics if a dimension or tile size is not positive.
    #[must_use]
    pub fn new(width: u32, height: u32, tile_width: f32, tile_height: f32, fill: Cell) -> Self {
        assert!(width > 0, "TileGrid width must be positive");
        assert!(height > 0, "TileGrid height must be positive");
        assert!(
            tile_width > 0.0 && tile_height > 0.0,
            "TileGrid tile size must be positive"
        );

        Self {
            width,
            height,
            tile_width,
            tile_height,
            cells: vec![fill; (width as usize) * (height as usize)],
        }
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile width in pixels.
    #[must_use]
    pub const fn tile_width(&self) -> f32 {
        self.tile_width
    }

    /// Tile height in pixels.
    #[must_use]
    pub const fn tile_height(&self) -> f32 {
        self.tile_height
    }

    /// Map size in pixels.
    #[must_use]
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.tile_width,
            self.height as f32 * self.tile_height,
        )
    }

    /// Check if a tile lies inside the grid.
    #[must_use]
    pub fn contains(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    #[inline]
    fn index(&self, pos: TilePos) -> usize {
        (pos.y as usize) * (self.width as usize) + (pos.x as usize)
    }

    /// Cell at a tile, `None` when out of bounds.
    #[must_use]
    pub fn get(&self, pos: TilePos) -> Option<Cell> {
        if self.contains(pos) {
            Some(self.cells[self.index(pos)])
        } else {
            None
        }
    }

    /// Overwrite a cell. Returns `false` if out of bounds.
    pub fn set(&mut self, pos: TilePos, cell: Cell) -> bool {
        if self.contains(pos) {
            let index = self.index(pos);
            self.cells[index] = cell;
            true
        } else {
            false
        }
    }

    /// Iterate over every tile and its cell, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (TilePos, Cell)> + '_ {
        let width = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (TilePos::new((i % width) as i32, (i / width) as i32), *cell))
    }

    /// Exact tile containing a pixel (floor division).
    #[must_use]
    pub fn tile_of(&self, point: Vec2) -> TilePos {
        TilePos::new(
            (point.x / self.tile_width).floor() as i32,
            (point.y / self.tile_height).floor() as i32,
        )
    }

    /// Nearest tile for an entity origin.
    ///
    /// A point more than half a tile past a tile's origin snaps to the next
    /// tile, so every entity occupies exactly one tile on the grid.
    #[must_use]
    pub fn shrunk_tile_of(&self, point: Vec2) -> TilePos {
        TilePos::new(
            snap_axis(point.x, self.tile_width),
            snap_axis(point.y, self.tile_height),
        )
    }

    /// Pixel origin (top-left corner) of a tile.
    #[must_use]
    pub fn tile_origin(&self, pos: TilePos) -> Vec2 {
        Vec2::new(
            pos.x as f32 * self.tile_width,
            pos.y as f32 * self.tile_height,
        )
    }

    /// Number of cells owned by `team`.
    #[must_use]
    pub fn owned_count(&self, team: Team) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell == Cell::Owned(team))
            .count()
    }
}

fn snap_axis(value: f32, tile: f32) -> i32 {
    let base = (value / tile).floor();
    if value - base * tile > tile / 2.0 {
        base as i32 + 1
    } else {
        base as i32
    }
}

/// A named marker from the map's object layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    /// Unit name such as `radar`, `turret` or `tank_3`.
    pub name: String,
    /// Owning team.
    pub team: Team,
    /// Pixel x of the marker origin.
    pub x: f32,
    /// Pixel y of the marker origin.
    pub y: f32,
}

/// Everything the core needs from the map loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Tile width in pixels.
    pub tile_width: f32,
    /// Tile height in pixels.
    pub tile_height: f32,
    /// Row-major terrain classification; `true` marks impassable terrain.
    pub impassable: Vec<bool>,
    /// Object markers for initial structures.
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

impl MapData {
    /// An open map with no impassable terrain and no markers.
    #[must_use]
    pub fn open(width: u32, height: u32, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_width: tile_size,
            tile_height: tile_size,
            impassable: vec![false; (width as usize) * (height as usize)],
            objects: Vec::new(),
        }
    }

    /// Mark a tile impassable. Out-of-range tiles are ignored.
    pub fn set_impassable(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            self.impassable[(y as usize) * (self.width as usize) + (x as usize)] = true;
        }
    }

    /// Check that dimensions and terrain data agree.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GameError::InvalidMap(format!(
                "map must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.tile_width <= 0.0 || self.tile_height <= 0.0 {
            return Err(GameError::InvalidMap(format!(
                "tile size must be positive, got {}x{}",
                self.tile_width, self.tile_height
            )));
        }
        let expected = (self.width as usize) * (self.height as usize);
        if self.impassable.len() != expected {
            return Err(GameError::InvalidMap(format!(
                "terrain has {} cells, expected {expected}",
                self.impassable.len()
            )));
        }
        Ok(())
    }

    /// Build the static passability grid.
    pub fn passability_grid(&self) -> Result<TileGrid> {
        self.validate()?;
        let mut grid = TileGrid::new(
            self.width,
            self.height,
            self.tile_width,
            self.tile_height,
            Cell::Passable,
        );
        for (i, blocked) in self.impassable.iter().enumerate() {
            if *blocked {
                let pos = TilePos::new(
                    (i % self.width as usize) as i32,
                    (i / self.width as usize) as i32,
                );
                grid.set(pos, Cell::Impassable);
            }
        }
        Ok(grid)
    }
}
