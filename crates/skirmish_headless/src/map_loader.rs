//! Tiled JSON map loading.
//!
//! Reads the subset of the Tiled editor's JSON export the simulation needs:
//! map and tile dimensions, tile layers, tileset tile types and object
//! groups. A tile whose tileset entry has type `imp` is impassable. Objects
//! become unit markers; their owner comes from a `team` custom property
//! (`1`/`2` or `red`/`blue`).

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use skirmish_core::factions::Team;
use skirmish_core::grid::{MapData, MapObject};

/// Tileset tile type that marks impassable terrain.
pub const IMPASSABLE_TYPE: &str = "imp";

/// Flip and rotation flags Tiled packs into the top bits of a gid.
const GID_FLAGS: u32 = 0xF000_0000;

/// Error type for map loading.
#[derive(Error, Debug)]
pub enum MapLoadError {
    /// Failed to read file.
    #[error("Failed to read map file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse JSON.
    #[error("Failed to parse map: {0}")]
    ParseError(#[from] serde_json::Error),
    /// A tile layer's size disagrees with the map.
    #[error("Tile layer '{layer}' has {actual} tiles, expected {expected}")]
    LayerSize {
        /// Layer name.
        layer: String,
        /// Cells in the layer.
        actual: usize,
        /// Cells in the map.
        expected: usize,
    },
    /// The map has no usable dimensions.
    #[error("Invalid map: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct TiledMap {
    width: u32,
    height: u32,
    tilewidth: f32,
    tileheight: f32,
    #[serde(default)]
    layers: Vec<TiledLayer>,
    #[serde(default)]
    tilesets: Vec<TiledTileset>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TiledLayer {
    #[serde(rename = "tilelayer")]
    Tiles {
        #[serde(default)]
        name: String,
        #[serde(default)]
        data: Vec<u32>,
    },
    #[serde(rename = "objectgroup")]
    Objects {
        #[serde(default)]
        objects: Vec<TiledObject>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TiledTileset {
    firstgid: u32,
    #[serde(default)]
    tiles: Vec<TiledTile>,
}

#[derive(Debug, Deserialize)]
struct TiledTile {
    id: u32,
    #[serde(default, alias = "class")]
    r#type: String,
}

#[derive(Debug, Deserialize)]
struct TiledObject {
    #[serde(default)]
    name: String,
    #[serde(default)]
    r#type: String,
    x: f32,
    y: f32,
    #[serde(default)]
    properties: Vec<TiledProperty>,
}

#[derive(Debug, Deserialize)]
struct TiledProperty {
    name: String,
    value: serde_json::Value,
}

impl TiledObject {
    /// Unit name: the object's name, or its type when the name is empty.
    fn unit_name(&self) -> &str {
        if self.name.is_empty() {
            &self.r#type
        } else {
            &self.name
        }
    }

    fn team(&self) -> Team {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case("team"))
            .and_then(|p| parse_team(&p.value))
            .unwrap_or(Team::Neutral)
    }
}

fn parse_team(value: &serde_json::Value) -> Option<Team> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|id| u8::try_from(id).ok())
            .and_then(Team::from_id),
        serde_json::Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "red" | "rebel" | "1" => Some(Team::Red),
            "blue" | "federal" | "2" => Some(Team::Blue),
            "neutral" | "0" => Some(Team::Neutral),
            _ => None,
        },
        _ => None,
    }
}

/// Parse a Tiled JSON export.
pub fn parse_map(json: &str) -> Result<MapData, MapLoadError> {
    let tiled: TiledMap = serde_json::from_str(json)?;
    if tiled.width == 0 || tiled.height == 0 {
        return Err(MapLoadError::Invalid(format!(
            "map must be at least 1x1, got {}x{}",
            tiled.width, tiled.height
        )));
    }

    let impassable_gids = impassable_gids(&tiled.tilesets);
    let mut map = MapData::open(tiled.width, tiled.height, tiled.tilewidth);
    map.tile_height = tiled.tileheight;
    let expected = map.impassable.len();

    for layer in &tiled.layers {
        match layer {
            TiledLayer::Tiles { name, data } => {
                if data.len() != expected {
                    return Err(MapLoadError::LayerSize {
                        layer: name.clone(),
                        actual: data.len(),
                        expected,
                    });
                }
                for (cell, gid) in map.impassable.iter_mut().zip(data) {
                    if impassable_gids.contains(&(gid & !GID_FLAGS)) {
                        *cell = true;
                    }
                }
            }
            TiledLayer::Objects { objects } => {
                map.objects.extend(objects.iter().map(|object| MapObject {
                    name: object.unit_name().to_string(),
                    team: object.team(),
                    x: object.x,
                    y: object.y,
                }));
            }
            TiledLayer::Other => {}
        }
    }

    tracing::debug!(
        width = map.width,
        height = map.height,
        impassable = map.impassable.iter().filter(|b| **b).count(),
        markers = map.objects.len(),
        "parsed Tiled map"
    );
    Ok(map)
}

/// Load a Tiled JSON export from disk.
pub fn load_map<P: AsRef<Path>>(path: P) -> Result<MapData, MapLoadError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    parse_map(&contents)
}

/// Global ids whose tileset entry is typed impassable.
fn impassable_gids(tilesets: &[TiledTileset]) -> HashSet<u32> {
    tilesets
        .iter()
        .flat_map(|set| {
            set.tiles
                .iter()
                .filter(|tile| tile.r#type == IMPASSABLE_TYPE)
                .map(move |tile| set.firstgid + tile.id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "width": 4,
        "height": 3,
        "tilewidth": 32,
        "tileheight": 32,
        "tilesets": [
            {"firstgid": 1, "tiles": [{"id": 2, "type": "imp"}, {"id": 3, "type": "water"}]},
            {"firstgid": 10, "tiles": [{"id": 0, "class": "imp"}]}
        ],
        "layers": [
            {"type": "tilelayer", "name": "ground", "width": 4, "height": 3,
             "data": [1, 1, 3, 1,
                      1, 4, 1, 1,
                      1, 1, 1, 10]},
            {"type": "objectgroup", "name": "units", "objects": [
                {"name": "radar", "x": 0, "y": 64,
                 "properties": [{"name": "team", "type": "int", "value": 1}]},
                {"name": "", "type": "turret", "x": 96, "y": 0,
                 "properties": [{"name": "team", "type": "string", "value": "blue"}]},
                {"name": "tank_2", "x": 32, "y": 32}
            ]},
            {"type": "imagelayer", "name": "sky"}
        ]
    }"#;

    #[test]
    fn test_imp_tiles_become_impassable() {
        let map = parse_map(SAMPLE).unwrap();
        let blocked: Vec<usize> = map
            .impassable
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(i, _)| i)
            .collect();
        // gid 3 is tile 2 of the first set, gid 10 is tile 0 of the second
        assert_eq!(blocked, vec![2, 11]);
        assert_eq!(map.width, 4);
        assert_eq!(map.tile_height, 32.0);
    }

    #[test]
    fn test_objects_become_markers() {
        let map = parse_map(SAMPLE).unwrap();
        assert_eq!(map.objects.len(), 3);
        assert_eq!(map.objects[0].name, "radar");
        assert_eq!(map.objects[0].team, Team::Red);
        assert_eq!(map.objects[1].name, "turret");
        assert_eq!(map.objects[1].team, Team::Blue);
        assert_eq!(map.objects[2].team, Team::Neutral);
    }

    #[test]
    fn test_flipped_gids_still_match() {
        let json = r#"{
            "width": 2, "height": 1, "tilewidth": 16, "tileheight": 16,
            "tilesets": [{"firstgid": 1, "tiles": [{"id": 0, "type": "imp"}]}],
            "layers": [{"type": "tilelayer", "data": [2147483649, 0]}]
        }"#;
        let map = parse_map(json).unwrap();
        assert_eq!(map.impassable, vec![true, false]);
    }

    #[test]
    fn test_short_layer_is_rejected() {
        let json = r#"{
            "width": 2, "height": 2, "tilewidth": 32, "tileheight": 32,
            "layers": [{"type": "tilelayer", "name": "broken", "data": [1, 1, 1]}]
        }"#;
        assert!(matches!(
            parse_map(json),
            Err(MapLoadError::LayerSize {
                actual: 3,
                expected: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_zero_sized_map_is_rejected() {
        let json = r#"{"width": 0, "height": 3, "tilewidth": 32, "tileheight": 32}"#;
        assert!(matches!(parse_map(json), Err(MapLoadError::Invalid(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let map = load_map(&path).unwrap();
        assert!(map.validate().is_ok());

        assert!(matches!(
            load_map(dir.path().join("missing.json")),
            Err(MapLoadError::ReadError(_))
        ));
    }
}
