//! Grid pathfinding using a wavefront (breadth-first distance labeling) search.
//!
//! The search never touches the live grid: callers hand it a snapshot copy
//! (see [`crate::registry::Registry::copy_passable_map`]) and the labels are
//! written into a private working buffer.

use serde::{Deserialize, Serialize};

use crate::grid::{TileGrid, TilePos};

/// Hard cap on wavefront expansion rounds. Exceeding it is a permanent
/// failure for that request.
pub const MAX_EXPANSIONS: i32 = 70;

/// A single orthogonal grid move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    /// Column delta, one of -1, 0, 1.
    pub dx: i32,
    /// Row delta, one of -1, 0, 1.
    pub dy: i32,
}

impl Step {
    /// Toward -x.
    pub const LEFT: Self = Self { dx: -1, dy: 0 };
    /// Toward +x.
    pub const RIGHT: Self = Self { dx: 1, dy: 0 };
    /// Toward -y.
    pub const UP: Self = Self { dx: 0, dy: -1 };
    /// Toward +y.
    pub const DOWN: Self = Self { dx: 0, dy: 1 };

    /// Facing in degrees a unit needs to travel along this step.
    #[must_use]
    pub fn facing(self) -> f32 {
        match (self.dx, self.dy) {
            (1, _) => 0.0,
            (_, 1) => 90.0,
            (-1, _) => 180.0,
            _ => -90.0,
        }
    }
}

/// Neighbor visit order. Only decides between equal-length paths.
const NEIGHBORS: [Step; 4] = [Step::LEFT, Step::RIGHT, Step::UP, Step::DOWN];

const UNVISITED: i32 = -1;
const BLOCKED: i32 = -2;

/// Distance labels for one search.
struct Wavefront {
    width: i32,
    height: i32,
    labels: Vec<i32>,
}

impl Wavefront {
    fn from_snapshot(snapshot: &TileGrid) -> Self {
        let width = snapshot.width() as i32;
        let height = snapshot.height() as i32;
        let labels = snapshot
            .iter()
            .map(|(_, cell)| if cell.is_open() { UNVISITED } else { BLOCKED })
            .collect();
        Self {
            width,
            height,
            labels,
        }
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            None
        } else {
            Some((pos.y * self.width + pos.x) as usize)
        }
    }

    fn label(&self, pos: TilePos) -> Option<i32> {
        self.index(pos).map(|i| self.labels[i])
    }

    fn set_label(&mut self, pos: TilePos, value: i32) {
        if let Some(i) = self.index(pos) {
            self.labels[i] = value;
        }
    }
}

/// Find a shortest 4-connected path from `source` to `goal`.
///
/// Returns the steps in source→goal order, an empty list when the two tiles
/// coincide, or `None` when the goal is blocked, unreachable, or further
/// than [`MAX_EXPANSIONS`] rounds away. The source tile is always treated as
/// open since the caller is standing on it.
#[must_use]
pub fn find_path(snapshot: &TileGrid, source: TilePos, goal: TilePos) -> Option<Vec<Step>> {
    let mut wave = Wavefront::from_snapshot(snapshot);

    if wave.label(source).is_none() || wave.label(goal) != Some(UNVISITED) {
        if source == goal && wave.label(source).is_some() {
            return Some(Vec::new());
        }
        return None;
    }
    if source == goal {
        return Some(Vec::new());
    }

    wave.set_label(source, 0);
    let mut frontier = vec![source];
    let mut distance = 0;

    while !frontier.is_empty() {
        if distance >= MAX_EXPANSIONS {
            tracing::trace!(?source, ?goal, "wavefront hit expansion cap");
            return None;
        }

        let mut next = Vec::new();
        for cell in &frontier {
            for step in NEIGHBORS {
                let neighbor = cell.offset(step.dx, step.dy);
                if wave.label(neighbor) == Some(UNVISITED) {
                    wave.set_label(neighbor, distance + 1);
                    next.push(neighbor);
                }
            }
        }
        distance += 1;

        if wave.label(goal) == Some(distance) {
            return Some(reconstruct_path(&wave, source, goal));
        }
        frontier = next;
    }

    None
}

/// Walk back from the goal along strictly decreasing labels.
fn reconstruct_path(wave: &Wavefront, source: TilePos, goal: TilePos) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut current = goal;

    while current != source {
        let Some(label) = wave.label(current) else {
            break;
        };
        let previous = NEIGHBORS
            .iter()
            .map(|step| current.offset(step.dx, step.dy))
            .find(|neighbor| wave.label(*neighbor) == Some(label - 1));

        let Some(previous) = previous else {
            break;
        };
        steps.push(Step {
            dx: current.x - previous.x,
            dy: current.y - previous.y,
        });
        current = previous;
    }

    steps.reverse();
    steps
}

/// Apply steps to a start tile.
#[must_use]
pub fn walk(start: TilePos, steps: &[Step]) -> TilePos {
    steps
        .iter()
        .fold(start, |pos, step| pos.offset(step.dx, step.dy))
}
