//! Board Presets
//!
//! Per-size win-target ranges. Each board size publishes the span of
//! target tiles a player may select; the default solo target is the top
//! of the range (2048 on the classic 4×4 board).

use serde::{Serialize, Deserialize};

use super::grid::Tile;

/// Selectable win-target range for one board size.
///
/// Levels are tile exponents: level 11 is the 2048 tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPreset {
    /// Board edge length this preset applies to.
    pub size: usize,
    /// Lowest selectable target level.
    pub min_target_level: u32,
    /// Highest selectable target level; the default target.
    pub max_target_level: u32,
}

/// Win-target ranges for every supported board size.
///
/// Sizes 7-9 interpolate monotonically between the published 6×6 and
/// 10×10 ranges.
pub const BOARD_PRESETS: [BoardPreset; 7] = [
    // 4x4: 256 ..= 2048
    BoardPreset { size: 4, min_target_level: 8, max_target_level: 11 },
    // 5x5: 1024 ..= 8192
    BoardPreset { size: 5, min_target_level: 10, max_target_level: 13 },
    // 6x6: 2048 ..= 16384
    BoardPreset { size: 6, min_target_level: 11, max_target_level: 14 },
    // 7x7: 4096 ..= 65536
    BoardPreset { size: 7, min_target_level: 12, max_target_level: 16 },
    // 8x8: 8192 ..= 131072
    BoardPreset { size: 8, min_target_level: 13, max_target_level: 17 },
    // 9x9: 16384 ..= 262144
    BoardPreset { size: 9, min_target_level: 14, max_target_level: 18 },
    // 10x10: 32768 ..= 1048576
    BoardPreset { size: 10, min_target_level: 15, max_target_level: 20 },
];

impl BoardPreset {
    /// Preset for a board size, or `None` outside the supported range.
    pub fn for_size(size: usize) -> Option<&'static BoardPreset> {
        BOARD_PRESETS.iter().find(|p| p.size == size)
    }

    /// Default win target for this size.
    pub fn default_target(&self) -> Tile {
        Tile(self.max_target_level)
    }

    /// Whether a target level is selectable on this board size.
    pub fn allows_target(&self, level: u32) -> bool {
        (self.min_target_level..=self.max_target_level).contains(&level)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MIN_GRID_SIZE, MAX_GRID_SIZE};

    #[test]
    fn test_every_size_has_a_preset() {
        for size in MIN_GRID_SIZE..=MAX_GRID_SIZE {
            assert!(BoardPreset::for_size(size).is_some(), "no preset for {size}");
        }
        assert!(BoardPreset::for_size(3).is_none());
        assert!(BoardPreset::for_size(11).is_none());
    }

    #[test]
    fn test_classic_board_targets() {
        let preset = BoardPreset::for_size(4).unwrap();
        assert_eq!(Tile(preset.min_target_level).value(), 256);
        assert_eq!(Tile(preset.max_target_level).value(), 2048);
        assert_eq!(preset.default_target().value(), 2048);
        assert!(preset.allows_target(9));
        assert!(!preset.allows_target(12));
    }

    #[test]
    fn test_largest_board_targets() {
        let preset = BoardPreset::for_size(10).unwrap();
        assert_eq!(Tile(preset.min_target_level).value(), 32768);
        assert_eq!(Tile(preset.max_target_level).value(), 1_048_576);
    }

    #[test]
    fn test_ranges_grow_with_size() {
        for pair in BOARD_PRESETS.windows(2) {
            assert!(pair[0].size < pair[1].size);
            assert!(pair[0].min_target_level < pair[1].min_target_level);
            assert!(pair[0].max_target_level < pair[1].max_target_level);
        }
    }
}
