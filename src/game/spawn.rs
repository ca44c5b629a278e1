//! Tile Spawning
//!
//! After every effective move (and twice at session start) one tile appears
//! on a uniformly random empty cell: value 2 at 90%, value 4 at 10%.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use super::grid::{Cell, Grid, Tile};

/// Percentage of spawns that produce a 4 instead of a 2.
pub const SPAWN_FOUR_PERCENT: u32 = 10;

/// A tile placed by the spawn step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedTile {
    /// Row the tile appeared in.
    pub row: usize,
    /// Column the tile appeared in.
    pub col: usize,
    /// The spawned tile (level 1 or 2).
    pub tile: Tile,
}

/// Spawn one tile on a random empty cell.
///
/// Draws the cell first, then the value, so a seeded RNG reproduces the
/// exact placement sequence. Returns `None` without consuming randomness
/// when the board is full.
pub fn spawn_tile(grid: &mut Grid, rng: &mut DeterministicRng) -> Option<SpawnedTile> {
    let empties = grid.empty_cells();
    let &(row, col) = rng.choose(&empties)?;

    let tile = if rng.chance(SPAWN_FOUR_PERCENT) {
        Tile(2)
    } else {
        Tile(1)
    };

    grid.set(row, col, Cell::Tile(tile));
    Some(SpawnedTile { row, col, tile })
}

// =============================================================================
// TESTS
// =============================================================================
