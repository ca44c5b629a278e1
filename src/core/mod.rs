//! Core deterministic primitives.
//!
//! The seeded PRNG that board sessions and match target selection draw
//! from, plus seed derivation. Everything here is deterministic given
//! its inputs.

pub mod rng;

// Re-export core types
pub use rng::{DeterministicRng, derive_match_seed};
