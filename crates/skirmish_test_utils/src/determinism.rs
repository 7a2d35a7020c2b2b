//! Replay checks for match determinism.
//!
//! A match is a pure function of its map, its configuration (seed
//! included) and the build commands issued into it. The helpers here build
//! the same match several times, record [`Simulation::state_hash`] after
//! every tick, and report the first tick at which any two runs disagree.
//!
//! Things that break it:
//!
//! - team AI draws that bypass the simulation's seeded RNG
//! - visiting entities through a hash map instead of registry slot order
//! - anything measured in wall-clock time instead of ticks

use std::thread;

use skirmish_core::simulation::Simulation;

/// State hashes of one run, one per tick (index 0 is the state before the
/// first tick).
pub type HashTrace = Vec<u64>;

/// Outcome of replaying one setup several times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// One trace per run.
    pub traces: Vec<HashTrace>,
    /// Ticks simulated per run.
    pub ticks: u64,
}

impl ReplayReport {
    /// First tick at which some run's hash differs from the first run's.
    #[must_use]
    pub fn first_divergence(&self) -> Option<u64> {
        let reference = self.traces.first()?;
        self.traces
            .iter()
            .skip(1)
            .filter_map(|trace| {
                trace
                    .iter()
                    .zip(reference)
                    .position(|(a, b)| a != b)
                    .map(|tick| tick as u64)
            })
            .min()
    }

    /// True when every run went through identical states.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.first_divergence().is_none()
    }

    /// Final hash of each run.
    #[must_use]
    pub fn final_hashes(&self) -> Vec<u64> {
        self.traces
            .iter()
            .filter_map(|trace| trace.last().copied())
            .collect()
    }

    /// Fail the test when runs disagreed.
    ///
    /// # Panics
    ///
    /// Panics with the divergence tick.
    pub fn assert_deterministic(&self) {
        if let Some(tick) = self.first_divergence() {
            panic!(
                "match diverged at tick {tick} ({} runs of {} ticks)\nfinal hashes: {:?}",
                self.traces.len(),
                self.ticks,
                self.final_hashes()
            );
        }
    }
}

/// Tick `sim` `ticks` times, hashing the state before and after each tick.
#[must_use]
pub fn trace(mut sim: Simulation, ticks: u64) -> HashTrace {
    let mut hashes = Vec::with_capacity(ticks as usize + 1);
    hashes.push(sim.state_hash());
    for _ in 0..ticks {
        sim.tick();
        hashes.push(sim.state_hash());
    }
    hashes
}

/// Build and run the same match `runs` times in sequence.
pub fn replay<F>(setup: F, runs: usize, ticks: u64) -> ReplayReport
where
    F: Fn() -> Simulation,
{
    ReplayReport {
        traces: (0..runs).map(|_| trace(setup(), ticks)).collect(),
        ticks,
    }
}

/// Build and run the same match on `threads` scoped threads at once.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn replay_parallel<F>(setup: F, threads: usize, ticks: u64) -> ReplayReport
where
    F: Fn() -> Simulation + Sync,
{
    let traces = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| s.spawn(|| trace(setup(), ticks)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });
    ReplayReport { traces, ticks }
}

/// Proptest strategies for grids and placements.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::grid::{Cell, TileGrid, TilePos};

    use crate::fixtures::TILE;

    /// Grid dimensions between 2 and `max` tiles per side.
    pub fn arb_dimensions(max: u32) -> impl Strategy<Value = (u32, u32)> {
        (2..=max, 2..=max)
    }

    /// A grid of the given size with roughly `wall_percent`% impassable
    /// cells.
    pub fn arb_grid(width: u32, height: u32, wall_percent: u32) -> impl Strategy<Value = TileGrid> {
        let cells = (width * height) as usize;
        proptest::collection::vec(0..100u32, cells).prop_map(move |rolls| {
            let mut grid = TileGrid::new(width, height, TILE, TILE, Cell::Passable);
            for (i, roll) in rolls.into_iter().enumerate() {
                if roll < wall_percent {
                    let pos = TilePos::new((i as u32 % width) as i32, (i as u32 / width) as i32);
                    grid.set(pos, Cell::Impassable);
                }
            }
            grid
        })
    }

    /// A tile inside a `width` x `height` grid.
    pub fn arb_tile(width: u32, height: u32) -> impl Strategy<Value = TilePos> {
        (0..width as i32, 0..height as i32).prop_map(|(x, y)| TilePos::new(x, y))
    }

    /// A grid plus a source and goal tile on it.
    pub fn arb_search(max: u32, wall_percent: u32) -> impl Strategy<Value = (TileGrid, TilePos, TilePos)> {
        arb_dimensions(max).prop_flat_map(move |(w, h)| {
            (arb_grid(w, h, wall_percent), arb_tile(w, h), arb_tile(w, h))
        })
    }
}
