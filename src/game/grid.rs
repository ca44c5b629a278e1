//! Board Grid and Tiles
//!
//! The playing field is an N×N matrix of cells stored row-major. A cell is
//! either explicitly empty or holds a tile; there are no sentinel values.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::{ErrorKind, MIN_GRID_SIZE, MAX_GRID_SIZE};

/// A single tile, stored as its power-of-two exponent.
///
/// A tile of level `k` displays the value `2^k`. Spawned tiles are level 1
/// (value 2) or level 2 (value 4); merging two level-`k` tiles produces one
/// of level `k + 1`. Storing the exponent keeps tiles exact at any board
/// size, and the materialized `u128` value covers every level reachable on
/// a supported board (the 10×10 ceiling is level 101).
///
/// Invariant: level ≥ 1, so every tile value is a power of two ≥ 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tile(pub u32);

impl Tile {
    /// Materialize the tile's numeric value.
    #[inline]
    pub fn value(&self) -> u128 {
        1u128 << self.0
    }

    /// The tile produced by merging two tiles of this level.
    #[inline]
    pub fn merged(&self) -> Tile {
        Tile(self.0 + 1)
    }

    /// The tile's power-of-two exponent.
    #[inline]
    pub fn level(&self) -> u32 {
        self.0
    }

    /// Convert a displayed value back into a tile.
    ///
    /// Returns `None` unless the value is a power of two ≥ 2.
    pub fn from_value(value: u128) -> Option<Tile> {
        if value >= 2 && value.is_power_of_two() {
            Some(Tile(value.trailing_zeros()))
        } else {
            None
        }
    }
}

/// One board cell: explicitly empty, or holding a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    /// No tile here.
    Empty,
    /// A tile of the given level.
    Tile(Tile),
}

impl Cell {
    /// Whether this cell is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// The tile in this cell, if any.
    #[inline]
    pub fn tile(&self) -> Option<Tile> {
        match self {
            Cell::Empty => None,
            Cell::Tile(t) => Some(*t),
        }
    }
}

/// Errors raised while constructing or populating a grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Requested edge length is outside the supported range.
    #[error("grid size {0} outside supported range {MIN_GRID_SIZE}..={MAX_GRID_SIZE}")]
    SizeOutOfRange(usize),
    /// A cell value is neither zero (empty) nor a power of two ≥ 2.
    #[error("{0} is not a valid tile value")]
    InvalidTileValue(u128),
    /// An input matrix is not square.
    #[error("row {row} has {len} cells, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },
}

impl GridError {
    /// Classify the error for callers and the wire.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidArgument
    }
}

/// An N×N board of cells, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create an empty grid. Edge length must be within the supported range.
    pub fn empty(size: usize) -> Result<Self, GridError> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size) {
            return Err(GridError::SizeOutOfRange(size));
        }
        Ok(Self {
            size,
            cells: vec![Cell::Empty; size * size],
        })
    }

    /// Build a grid from a matrix of displayed values; `0` means empty.
    ///
    /// Rejects non-square input, out-of-range sizes, and values that are
    /// not powers of two ≥ 2.
    pub fn from_values(rows: &[&[u128]]) -> Result<Self, GridError> {
        let mut grid = Self::empty(rows.len())?;
        for (r, row) in rows.iter().enumerate() {
            if row.len() != grid.size {
                return Err(GridError::NotSquare {
                    row: r,
                    len: row.len(),
                    expected: grid.size,
                });
            }
            for (c, &value) in row.iter().enumerate() {
                if value == 0 {
                    continue;
                }
                let tile = Tile::from_value(value).ok_or(GridError::InvalidTileValue(value))?;
                grid.set(r, c, Cell::Tile(tile));
            }
        }
        Ok(grid)
    }

    /// Edge length of the board.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Empty every cell, keeping the size.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    /// Cell at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Cell {
        debug_assert!(row < self.size && col < self.size);
        self.cells[row * self.size + col]
    }

    /// Overwrite the cell at `(row, col)`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        debug_assert!(row < self.size && col < self.size);
        self.cells[row * self.size + col] = cell;
    }

    /// Coordinates of all empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        let mut empties = Vec::new();
        for row in 0..self.size {
            for col in 0..self.size {
                if self.get(row, col).is_empty() {
                    empties.push((row, col));
                }
            }
        }
        empties
    }

    /// Number of empty cells.
    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_empty()).count()
    }

    /// The highest tile on the board, if any tile exists.
    pub fn highest_tile(&self) -> Option<Tile> {
        self.cells.iter().filter_map(Cell::tile).max()
    }

    /// Sum of all tile values on the board.
    pub fn total_value(&self) -> u128 {
        self.cells.iter().filter_map(Cell::tile).map(|t| t.value()).sum()
    }

    /// Whether any legal move remains: an empty cell, or two equal
    /// neighbors in a row or column.
    ///
    /// Advisory query for clients; no session transition consumes it.
    pub fn has_moves(&self) -> bool {
        for row in 0..self.size {
            for col in 0..self.size {
                let cell = self.get(row, col);
                if cell.is_empty() {
                    return true;
                }
                if col + 1 < self.size && cell == self.get(row, col + 1) {
                    return true;
                }
                if row + 1 < self.size && cell == self.get(row + 1, col) {
                    return true;
                }
            }
        }
        false
    }

    /// Board contents as a matrix of displayed values; empty cells are `0`.
    pub fn to_values(&self) -> Vec<Vec<u128>> {
        (0..self.size)
            .map(|r| {
                (0..self.size)
                    .map(|c| self.get(r, c).tile().map_or(0, |t| t.value()))
                    .collect()
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
