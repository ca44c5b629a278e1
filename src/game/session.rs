//! Game Session
//!
//! The solo-play state machine around the move engine: spawn-on-init,
//! move-commit-spawn, win detection against a target tile, the timed-mode
//! countdown, and restart. `apply` and `tick_timer` are the only mutating
//! entry points during play.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::{ErrorKind, TIMED_MODE_SECS};
use crate::core::rng::DeterministicRng;
use super::config::BoardPreset;
use super::grid::{Grid, GridError, Tile};
use super::moves::{apply_move, Direction, MergeEvent};
use super::spawn::{spawn_tile, SpawnedTile};

/// Lifecycle of a session.
///
/// `Initializing` covers board construction and the two opening spawns;
/// `Won` and `Lost` are terminal and reject further moves until `restart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Board is being built and seeded with its opening tiles.
    #[default]
    Initializing,
    /// Accepting moves.
    Active,
    /// A merge reached the target tile.
    Won,
    /// The timed-mode countdown ran out.
    Lost,
}

impl SessionPhase {
    /// Whether the session has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Won | SessionPhase::Lost)
    }
}

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Invalid board parameters.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// A move was requested on a finished session.
    #[error("session is over; restart to keep playing")]
    SessionOver,
}

impl GameError {
    /// Classify the error for callers and the wire.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::Grid(e) => e.kind(),
            GameError::SessionOver => ErrorKind::IllegalState,
        }
    }
}

/// Parameters a session is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Board edge length.
    pub grid_size: usize,
    /// Win target: the first merge at or above this tile wins.
    pub target: Tile,
    /// Whether the countdown is running.
    pub timed: bool,
    /// Countdown length for timed sessions, in seconds.
    pub time_limit_secs: u32,
    /// Seed for the spawn RNG; a seed fully reproduces a session.
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grid_size: 4,
            // 2048, the classic 4x4 default target.
            target: Tile(11),
            timed: false,
            time_limit_secs: TIMED_MODE_SECS,
            seed: 0,
        }
    }
}

impl SessionConfig {
    /// Config for a board size with that size's default target.
    ///
    /// Returns `None` for sizes without a preset.
    pub fn for_size(size: usize) -> Option<Self> {
        let preset = BoardPreset::for_size(size)?;
        Some(Self {
            grid_size: size,
            target: preset.default_target(),
            ..Self::default()
        })
    }
}

/// What one call to [`GameSession::apply`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Whether any cell changed; `false` means nothing was committed.
    pub moved: bool,
    /// Score gained by this move.
    pub score_delta: u128,
    /// Merges performed, for animation and block reporting.
    pub merges: Vec<MergeEvent>,
    /// The tile spawned after the move, if the move was effective.
    pub spawned: Option<SpawnedTile>,
    /// Session phase after the move.
    pub phase: SessionPhase,
}

/// A solo game in progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    /// Parameters the session was created with.
    pub config: SessionConfig,
    /// Current board.
    pub grid: Grid,
    /// Accumulated score.
    pub score: u128,
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Seconds left, for timed sessions.
    pub time_remaining: Option<u32>,
    /// Spawn randomness; advances with every spawn.
    pub rng: DeterministicRng,
}

impl GameSession {
    /// Create a session: empty board, two opening spawns, score zero,
    /// countdown armed in timed mode.
    pub fn new(config: SessionConfig) -> Result<Self, GameError> {
        let mut session = Self {
            grid: Grid::empty(config.grid_size)?,
            score: 0,
            phase: SessionPhase::Initializing,
            time_remaining: config.timed.then_some(config.time_limit_secs),
            rng: DeterministicRng::new(config.seed),
            config,
        };
        session.populate();
        Ok(session)
    }

    /// Opening spawns; leaves the session Active.
    fn populate(&mut self) {
        spawn_tile(&mut self.grid, &mut self.rng);
        spawn_tile(&mut self.grid, &mut self.rng);
        self.phase = SessionPhase::Active;
    }

    /// Apply one move.
    ///
    /// On a terminal session this is rejected without touching state.
    /// An ineffective move (`moved == false`) commits nothing: no spawn,
    /// no score. An effective move commits the grid, adds the score
    /// delta, spawns one tile, and flips to `Won` if a merge reached the
    /// target.
    pub fn apply(&mut self, direction: Direction) -> Result<MoveOutcome, GameError> {
        if self.phase.is_terminal() {
            return Err(GameError::SessionOver);
        }

        let result = apply_move(&self.grid, direction);
        if !result.moved {
            return Ok(MoveOutcome {
                moved: false,
                score_delta: 0,
                merges: Vec::new(),
                spawned: None,
                phase: self.phase,
            });
        }

        let target_met = result
            .highest_merge()
            .map_or(false, |tile| tile.level() >= self.config.target.level());

        self.grid = result.grid;
        self.score += result.score_delta;
        let spawned = spawn_tile(&mut self.grid, &mut self.rng);

        if target_met {
            self.phase = SessionPhase::Won;
        }

        Ok(MoveOutcome {
            moved: true,
            score_delta: result.score_delta,
            merges: result.merges,
            spawned,
            phase: self.phase,
        })
    }

    /// Advance the countdown by one second.
    ///
    /// Driven by the client once per wall-clock second. Does nothing on
    /// untimed or terminal sessions; at zero the session is Lost.
    pub fn tick_timer(&mut self) {
        if self.phase != SessionPhase::Active {
            return;
        }
        let Some(remaining) = self.time_remaining.as_mut() else {
            return;
        };
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.phase = SessionPhase::Lost;
        }
    }

    /// Start over with the same configuration: cleared board, fresh
    /// opening spawns, score and countdown reset.
    pub fn restart(&mut self) {
        self.grid.clear();
        self.score = 0;
        self.phase = SessionPhase::Initializing;
        self.time_remaining = self.config.timed.then_some(self.config.time_limit_secs);
        self.populate();
    }
}

// =============================================================================
// TESTS
// =============================================================================
