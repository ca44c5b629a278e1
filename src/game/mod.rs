//! Game Logic Module
//!
//! The deterministic board game: grid, move resolution, spawning, and the
//! solo session state machine. Everything here is synchronous and
//! reproducible from a seed; the network layer never reaches into it.
//!
//! ## Module Structure
//!
//! - `grid`: Cells, tiles, and the N×N board
//! - `moves`: Directional move resolution and merging
//! - `spawn`: Random tile placement (90% twos, 10% fours)
//! - `session`: Solo session lifecycle, scoring, timed mode
//! - `config`: Per-size board presets

pub mod grid;
pub mod moves;
pub mod spawn;
pub mod session;
pub mod config;

// Re-export key types
pub use grid::{Cell, Grid, GridError, Tile};
pub use moves::{apply_move, Direction, MergeEvent, MoveResult};
pub use spawn::{spawn_tile, SpawnedTile};
pub use session::{GameError, GameSession, MoveOutcome, SessionConfig, SessionPhase};
pub use config::BoardPreset;
