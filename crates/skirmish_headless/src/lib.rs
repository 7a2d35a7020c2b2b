//! Headless match runner for AI-versus-AI testing and CI.
//!
//! Loads Tiled JSON maps, runs a [`skirmish_core`] simulation without any
//! rendering, and streams per-team status as JSON lines:
//!
//! - **stdout**: one [`runner::Snapshot`] per line
//! - **stderr**: logs (human-readable)
//!
//! Finished matches can be recorded in a persisted best-score list.
//!
//! # Example
//!
//! ```bash
//! # AI versus AI on a Tiled map
//! cargo run -p skirmish_headless -- run --map maps/valley.json --ticks 3000
//!
//! # Smoke test on the built-in map
//! cargo run -p skirmish_headless -- demo
//! ```

pub mod map_loader;
pub mod runner;
pub mod scores;

pub use map_loader::{load_map, parse_map, MapLoadError};
pub use runner::{demo_map, MatchRunner, MatchSummary, RunConfig, RunError, Snapshot};
pub use scores::{record_score, ScoreBoard, ScoreEntry, ScoreError};
