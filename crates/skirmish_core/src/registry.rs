//! Entity registry and physics layer.
//!
//! The registry owns every live entity in an arena of slots with a free
//! list, and it is the only place entity positions change: every move goes
//! through [`Registry::is_passable`]. It also keeps the live passability
//! snapshot (static terrain plus stationary structures) that pathfinding
//! copies from.

use serde::{Deserialize, Serialize};

use crate::components::{Entity, EntityId};
use crate::error::Result;
use crate::grid::{Cell, MapData, TileGrid, TilePos};
use crate::math::Vec2;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Arena of entity slots plus the map's passability grids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    slots: Vec<Slot>,
    /// Vacated slots, reused last-in first-out.
    free: Vec<u32>,
    /// Terrain only; `None` until the map is attached.
    terrain: Option<TileGrid>,
    /// Terrain plus stationary structures, rebuilt lazily.
    live: Option<TileGrid>,
    live_dirty: bool,
}

impl Registry {
    /// Create an empty registry with no map attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the map. Until this happens every movement is refused.
    pub fn load_map(&mut self, map: &MapData) -> Result<()> {
        self.terrain = Some(map.passability_grid()?);
        self.live_dirty = true;
        tracing::debug!(width = map.width, height = map.height, "passability grid built");
        Ok(())
    }

    /// True once the map is attached.
    #[must_use]
    pub const fn is_map_loaded(&self) -> bool {
        self.terrain.is_some()
    }

    /// Static terrain grid.
    #[must_use]
    pub fn terrain(&self) -> Option<&TileGrid> {
        self.terrain.as_ref()
    }

    /// Insert an entity, assigning it a (possibly reused) slot.
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        #[cfg(feature = "debug-validation")]
        debug_assert!(entity.hp <= entity.max_hp, "hp above max_hp on insert");

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let entry = &mut self.slots[slot as usize];
        let id = EntityId {
            slot,
            generation: entry.generation,
        };
        entity.id = id;
        if is_structure(&entity) {
            self.live_dirty = true;
        }
        entry.entity = Some(entity);
        id
    }

    /// Deregister an entity.
    ///
    /// The pending decision is cancelled and `on_removed` runs (for score
    /// and territory bookkeeping) before the slot is vacated.
    pub fn remove_entity<F>(&mut self, id: EntityId, on_removed: F) -> Option<Entity>
    where
        F: FnOnce(&Entity),
    {
        let entry = self.slots.get_mut(id.slot as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        let entity = entry.entity.as_mut()?;
        entity.schedule.cancel();
        on_removed(entity);

        let entity = entry.entity.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.slot);
        if is_structure(&entity) {
            self.live_dirty = true;
        }
        Some(entity)
    }

    /// Look up a live entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots
            .get(id.slot as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_ref())
    }

    /// Look up a live entity mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.slot as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_mut())
    }

    /// True when `id` names a registered entity that is not destroyed.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(|e| !e.is_destroyed())
    }

    /// Live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(|slot| slot.entity.as_ref())
    }

    /// Ids of live entities in slot order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|e| e.id).collect()
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True when no entity is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Can `id` occupy the area with top-left corner `position`?
    ///
    /// False when the footprint would leave the map, overlap impassable
    /// terrain, or bring the entity's center closer than its own width to
    /// any other entity's center. Unknown ids and an unloaded map are never
    /// passable.
    #[must_use]
    pub fn is_passable(&self, position: Vec2, id: EntityId) -> bool {
        match self.get(id) {
            Some(mover) => self.is_area_free(position, mover.width(), mover.height(), Some(id)),
            None => false,
        }
    }

    /// Passability test for a `w` x `h` footprint at `position`, ignoring
    /// `exclude`. Also used to vet build sites before anything exists there.
    #[must_use]
    pub fn is_area_free(&self, position: Vec2, w: f32, h: f32, exclude: Option<EntityId>) -> bool {
        let Some(terrain) = self.terrain.as_ref() else {
            return false;
        };

        let size = terrain.pixel_size();
        if position.x < 0.0 || position.y < 0.0 || position.x + w > size.x || position.y + h > size.y
        {
            return false;
        }

        if covers_impassable(terrain, position, w, h) {
            return false;
        }

        let center = Vec2::new(position.x + w / 2.0, position.y + h / 2.0);
        let clearance_sq = w * w;
        !self
            .iter()
            .filter(|other| Some(other.id) != exclude)
            .any(|other| other.center().distance_squared(center) < clearance_sq)
    }

    /// Move an entity by `delta` if the destination is passable.
    pub fn try_move(&mut self, id: EntityId, delta: Vec2) -> bool {
        let Some(entity) = self.get(id) else {
            return false;
        };
        if !entity.caps.movable {
            return false;
        }
        let destination = entity.position + delta;
        if !self.is_passable(destination, id) {
            return false;
        }
        if let Some(entity) = self.get_mut(id) {
            entity.position = destination;
            tracing::trace!(%id, x = destination.x, y = destination.y, "moved");
        }
        true
    }

    /// Entities whose center lies within `radius` of `point`.
    pub fn entities_in_range(&self, point: Vec2, radius: f32) -> impl Iterator<Item = &Entity> {
        let radius_sq = radius * radius;
        self.iter()
            .filter(move |e| e.center().distance_squared(point) <= radius_sq)
    }

    /// Deep copy of the live passability snapshot.
    ///
    /// Structures that are destructible and stationary appear as
    /// [`Cell::Occupied`] on their shrunk tile. Returns `None` until the map
    /// is attached.
    pub fn copy_passable_map(&mut self) -> Option<TileGrid> {
        if self.live_dirty || self.live.is_none() {
            self.rebuild_live();
        }
        self.live.clone()
    }

    fn rebuild_live(&mut self) {
        let Some(terrain) = self.terrain.as_ref() else {
            return;
        };
        let mut live = terrain.clone();
        for entity in self.slots.iter().filter_map(|slot| slot.entity.as_ref()) {
            if is_structure(entity) {
                let tile = live.shrunk_tile_of(entity.position);
                if live.get(tile) == Some(Cell::Passable) {
                    live.set(tile, Cell::Occupied);
                }
            }
        }
        self.live = Some(live);
        self.live_dirty = false;
    }

    /// Exact tile under a pixel, `None` before the map is attached.
    #[must_use]
    pub fn tile_of(&self, point: Vec2) -> Option<TilePos> {
        self.terrain.as_ref().map(|t| t.tile_of(point))
    }

    /// Shrunk (nearest) tile for an entity origin.
    #[must_use]
    pub fn shrunk_tile_of(&self, point: Vec2) -> Option<TilePos> {
        self.terrain.as_ref().map(|t| t.shrunk_tile_of(point))
    }
}

/// Stationary destructible entities block their tile on the grid.
fn is_structure(entity: &Entity) -> bool {
    entity.caps.destructible && !entity.caps.movable
}

fn covers_impassable(terrain: &TileGrid, position: Vec2, w: f32, h: f32) -> bool {
    let first = terrain.tile_of(position);
    // Right/bottom edges are exclusive so a flush footprint stays in its tiles
    let last = TilePos::new(
        last_covered(position.x + w, terrain.tile_width()).max(first.x),
        last_covered(position.y + h, terrain.tile_height()).max(first.y),
    );
    (first.y..=last.y).any(|y| {
        (first.x..=last.x).any(|x| terrain.get(TilePos::new(x, y)) == Some(Cell::Impassable))
    })
}

/// Index of the tile holding the exclusive edge `edge`.
fn last_covered(edge: f32, tile_size: f32) -> i32 {
    (edge / tile_size).ceil() as i32 - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Footprint;
    use crate::factions::Team;
    use crate::unit_kind::{TankVariant, UnitKind};

    fn tank(x: f32, y: f32) -> Entity {
        Entity::new(
            UnitKind::Tank(TankVariant::Light),
            Team::Red,
            Vec2::new(x, y),
            0.0,
        )
        .with_footprint(Footprint::new(32.0, 32.0))
    }

    fn registry(w: u32, h: u32) -> Registry {
        let mut reg = Registry::new();
        reg.load_map(&MapData::open(w, h, 32.0)).unwrap();
        reg
    }

    #[test]
    fn test_slots_are_reused_with_new_generation() {
        let mut reg = registry(4, 4);
        let a = reg.add_entity(tank(0.0, 0.0));
        let b = reg.add_entity(tank(64.0, 0.0));
        assert_eq!((a.slot, b.slot), (0, 1));

        assert!(reg.remove_entity(a, |_| {}).is_some());
        assert!(reg.get(a).is_none());

        let c = reg.add_entity(tank(0.0, 64.0));
        assert_eq!(c.slot, 0);
        assert_ne!(c.generation, a.generation);
        assert!(reg.get(a).is_none(), "stale id must not resolve");
        assert!(reg.get(c).is_some());
    }

    #[test]
    fn test_remove_runs_callback_before_vacating() {
        let mut reg = registry(4, 4);
        let id = reg.add_entity(tank(0.0, 0.0));
        reg.get_mut(id).unwrap().schedule.delayed_call(0, 3);

        let mut seen = None;
        let removed = reg.remove_entity(id, |e| seen = Some((e.id, e.schedule)));
        assert_eq!(seen, Some((id, crate::schedule::Schedule::Idle)));
        assert!(removed.is_some());
        assert!(reg.remove_entity(id, |_| panic!("called twice")).is_none());
    }

    #[test]
    fn test_iteration_skips_free_slots() {
        let mut reg = registry(8, 8);
        let ids: Vec<_> = (0..4)
            .map(|i| reg.add_entity(tank(i as f32 * 64.0, 0.0)))
            .collect();
        reg.remove_entity(ids[1], |_| {});
        assert_eq!(reg.ids(), vec![ids[0], ids[2], ids[3]]);
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_not_passable_out_of_bounds() {
        let mut reg = registry(4, 4);
        let id = reg.add_entity(tank(0.0, 0.0));
        assert!(reg.is_passable(Vec2::new(96.0, 96.0), id));
        assert!(!reg.is_passable(Vec2::new(-1.0, 0.0), id));
        assert!(!reg.is_passable(Vec2::new(97.0, 0.0), id));
        assert!(!reg.is_passable(Vec2::new(0.0, 100.0), id));
    }

    #[test]
    fn test_not_passable_on_impassable_terrain() {
        let mut map = MapData::open(4, 4, 32.0);
        map.set_impassable(2, 0);
        let mut reg = Registry::new();
        reg.load_map(&map).unwrap();
        let id = reg.add_entity(tank(0.0, 0.0));

        assert!(reg.is_passable(Vec2::new(32.0, 0.0), id));
        assert!(!reg.is_passable(Vec2::new(40.0, 0.0), id));
        assert!(!reg.is_passable(Vec2::new(64.0, 0.0), id));
    }

    #[test]
    fn test_flush_against_wall_is_passable_far_from_origin() {
        for n in [3u32, 5, 8, 11, 15, 18] {
            let mut map = MapData::open(20, 20, 32.0);
            map.set_impassable(n + 1, 5);
            map.set_impassable(5, n + 1);
            let mut reg = Registry::new();
            reg.load_map(&map).unwrap();
            let id = reg.add_entity(tank(0.0, 0.0));
            let at = n as f32 * 32.0;

            assert!(reg.is_passable(Vec2::new(at, 160.0), id), "east wall, column {n}");
            assert!(!reg.is_passable(Vec2::new(at + 0.5, 160.0), id), "east overlap, column {n}");
            assert!(reg.is_passable(Vec2::new(160.0, at), id), "south wall, row {n}");
            assert!(!reg.is_passable(Vec2::new(160.0, at + 0.5), id), "south overlap, row {n}");
        }
    }

    #[test]
    fn test_not_passable_near_other_entity() {
        let mut reg = registry(8, 8);
        let mover = reg.add_entity(tank(0.0, 0.0));
        reg.add_entity(tank(96.0, 0.0));

        assert!(reg.is_passable(Vec2::new(64.0, 0.0), mover));
        assert!(!reg.is_passable(Vec2::new(70.0, 0.0), mover));
    }

    #[test]
    fn test_try_move_refuses_and_keeps_position() {
        let mut reg = registry(4, 4);
        let id = reg.add_entity(tank(0.0, 0.0));
        assert!(!reg.try_move(id, Vec2::new(-4.0, 0.0)));
        assert_eq!(reg.get(id).unwrap().position, Vec2::ZERO);
        assert!(reg.try_move(id, Vec2::new(4.0, 0.0)));
        assert_eq!(reg.get(id).unwrap().position, Vec2::new(4.0, 0.0));
    }

    #[test]
    fn test_no_map_means_nothing_is_passable() {
        let mut reg = Registry::new();
        let id = reg.add_entity(tank(0.0, 0.0));
        assert!(!reg.is_passable(Vec2::ZERO, id));
        assert!(reg.copy_passable_map().is_none());
    }

    #[test]
    fn test_entities_in_range() {
        let mut reg = registry(10, 10);
        let near = reg.add_entity(tank(0.0, 0.0));
        reg.add_entity(tank(200.0, 0.0));
        let found: Vec<_> = reg
            .entities_in_range(Vec2::new(16.0, 16.0), 100.0)
            .map(|e| e.id)
            .collect();
        assert_eq!(found, vec![near]);
    }

    #[test]
    fn test_passable_map_marks_structures_and_is_a_copy() {
        let mut reg = registry(4, 4);
        let turret = reg.add_entity(
            Entity::new(UnitKind::Turret, Team::Blue, Vec2::new(64.0, 32.0), 0.0)
                .with_footprint(Footprint::new(32.0, 32.0)),
        );
        reg.add_entity(tank(0.0, 0.0));

        let mut snapshot = reg.copy_passable_map().unwrap();
        assert_eq!(snapshot.get(TilePos::new(2, 1)), Some(Cell::Occupied));
        assert_eq!(snapshot.get(TilePos::new(0, 0)), Some(Cell::Passable));

        snapshot.set(TilePos::new(3, 3), Cell::Impassable);
        let fresh = reg.copy_passable_map().unwrap();
        assert_eq!(fresh.get(TilePos::new(3, 3)), Some(Cell::Passable));

        reg.remove_entity(turret, |_| {});
        let cleared = reg.copy_passable_map().unwrap();
        assert_eq!(cleared.get(TilePos::new(2, 1)), Some(Cell::Passable));
    }
}
