//! # Merge Battle
//!
//! Deterministic tile-merge puzzle core (2048 family) plus the real-time
//! PvP match server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      MERGE BATTLE                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  └── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │                                                              │
//! │  game/           - Board game (deterministic)                │
//! │  ├── grid.rs     - Cells, tiles, N×N board                   │
//! │  ├── moves.rs    - Move resolution and merging               │
//! │  ├── spawn.rs    - Random tile placement                     │
//! │  ├── session.rs  - Solo session state machine                │
//! │  └── config.rs   - Per-size board presets                    │
//! │                                                              │
//! │  network/        - PvP coordination (non-deterministic)      │
//! │  ├── server.rs   - WebSocket server                          │
//! │  ├── protocol.rs - Wire message types                        │
//! │  └── coordinator.rs - Match registry and per-match tasks     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No `HashMap` (sorted `BTreeMap` iteration where maps are needed)
//! - No system time dependencies
//! - All randomness from seeded Xorshift128+
//!
//! Given the same seed and move sequence, a session reproduces the exact
//! same boards, spawns, and score on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

use serde::{Serialize, Deserialize};
use std::fmt;

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use game::grid::{Cell, Grid, Tile};
pub use game::moves::{apply_move, Direction, MoveResult};
pub use game::session::{GameSession, SessionConfig, SessionPhase};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Smallest supported board edge length
pub const MIN_GRID_SIZE: usize = 4;

/// Largest supported board edge length
pub const MAX_GRID_SIZE: usize = 10;

/// Countdown length of a timed session, in seconds
pub const TIMED_MODE_SECS: u32 = 180;

/// Highest target-block level a PvP match may roll (levels are 1-based)
pub const MAX_TARGET_LEVEL: u32 = 12;

/// Error classification shared by every fallible operation.
///
/// All errors are local, synchronous, and non-retryable; nothing beyond
/// this taxonomy crosses to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input outside the accepted domain.
    InvalidArgument,
    /// Operation valid in form, but the state forbids it.
    IllegalState,
    /// The named match does not exist and the operation does not create it.
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::IllegalState => "illegal_state",
            ErrorKind::NotFound => "not_found",
        };
        write!(f, "{}", name)
    }
}
