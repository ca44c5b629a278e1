//! Move Application
//!
//! Pure move resolution: every direction is reduced to a canonical leftward
//! compaction by an index transform, merged in a single pass, then written
//! back through the same transform. No randomness here; spawning is the
//! caller's concern.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::ErrorKind;
use super::grid::{Cell, Grid, Tile};

/// One of the four move directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Compact tiles toward column 0.
    Left,
    /// Compact tiles toward the last column.
    Right,
    /// Compact tiles toward row 0.
    Up,
    /// Compact tiles toward the last row.
    Down,
}

impl Direction {
    /// All directions, in a fixed order.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        };
        write!(f, "{}", name)
    }
}

/// Error for unparseable direction input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown direction `{0}`")]
pub struct ParseDirectionError(pub String);

impl ParseDirectionError {
    /// Classify the error for callers and the wire.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidArgument
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(ParseDirectionError(other.to_string())),
        }
    }
}

/// A merge that happened during a move, in input-grid coordinates.
///
/// `tile` is the resulting (doubled) tile sitting at `(row, col)` in the
/// returned grid. Clients use these for animation and for reporting
/// created blocks to a PvP match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEvent {
    /// Row of the merged tile in the result grid.
    pub row: usize,
    /// Column of the merged tile in the result grid.
    pub col: usize,
    /// The tile the merge produced.
    pub tile: Tile,
}

/// Outcome of applying one move to a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResult {
    /// The board after the move.
    pub grid: Grid,
    /// Whether any cell changed. A move that displaces nothing and merges
    /// nothing reports `false` and must not commit, spawn, or score.
    pub moved: bool,
    /// Sum of the values created by merges this move.
    pub score_delta: u128,
    /// Every merge performed, in row scan order.
    pub merges: Vec<MergeEvent>,
}

impl MoveResult {
    /// The highest tile produced by a merge this move, if any.
    pub fn highest_merge(&self) -> Option<Tile> {
        self.merges.iter().map(|m| m.tile).max()
    }
}

/// Map canonical coordinates onto the input grid for a direction.
///
/// Canonical space is "compact toward column 0": canonical cell `(r, c)`
/// reads from and writes to the returned input-grid coordinates. The
/// mapping is a bijection, so one pass covers every cell exactly once.
#[inline]
fn source(direction: Direction, size: usize, row: usize, col: usize) -> (usize, usize) {
    match direction {
        Direction::Left => (row, col),
        Direction::Right => (row, size - 1 - col),
        Direction::Up => (col, row),
        Direction::Down => (size - 1 - col, row),
    }
}

/// Apply one move to a grid.
///
/// Per canonical row: tiles compact toward index 0 keeping their relative
/// order, then a single left-to-right pass merges adjacent equal tiles.
/// Each tile participates in at most one merge per move, so
/// `[2, 2, 2, 2]` becomes `[4, 4, _, _]`, never `[8, _, _, _]`.
///
/// The input grid is untouched; the result carries the new grid, the
/// score delta, and merge positions mapped back to input orientation.
pub fn apply_move(grid: &Grid, direction: Direction) -> MoveResult {
    let size = grid.size();
    let mut out = grid.clone();
    let mut merges = Vec::new();
    let mut score_delta: u128 = 0;

    for row in 0..size {
        // Tiles of this canonical row, compacted by collection order.
        let mut line: Vec<Tile> = Vec::with_capacity(size);
        for col in 0..size {
            let (sr, sc) = source(direction, size, row, col);
            if let Cell::Tile(tile) = grid.get(sr, sc) {
                line.push(tile);
            }
        }

        // Single merge pass; a merged tile never merges again this move.
        let mut settled: Vec<Tile> = Vec::with_capacity(line.len());
        let mut i = 0;
        while i < line.len() {
            if i + 1 < line.len() && line[i] == line[i + 1] {
                let tile = line[i].merged();
                score_delta += tile.value();
                let (mr, mc) = source(direction, size, row, settled.len());
                merges.push(MergeEvent { row: mr, col: mc, tile });
                settled.push(tile);
                i += 2;
            } else {
                settled.push(line[i]);
                i += 1;
            }
        }

        // Write back, padding the tail with empties.
        for col in 0..size {
            let (sr, sc) = source(direction, size, row, col);
            let cell = settled.get(col).map_or(Cell::Empty, |t| Cell::Tile(*t));
            out.set(sr, sc, cell);
        }
    }

    let moved = out != *grid;
    MoveResult { grid: out, moved, score_delta, merges }
}

// =============================================================================
// TESTS
// =============================================================================
