// Compression level -> match search parameters.
//
// Levels only change how far back the encoder looks; the stream format and
// the decoder are the same for every level.

/// Shortest back-reference the format can express.
pub const MIN_MATCH: usize = 3;
/// Longest back-reference (long form: 0xFF + 0x12).
pub const MAX_MATCH: usize = 0xFF + 0x12;
/// Longest length the two-byte short form holds.
pub const MAX_SHORT_MATCH: usize = 0x11;
/// Largest distance a 12-bit field can hold (stored minus one).
pub const MAX_DISTANCE: usize = 0x1000;

pub const MIN_LEVEL: u32 = 1;
pub const MAX_LEVEL: u32 = 9;
pub const DEFAULT_LEVEL: u32 = 9;

/// Search parameters for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Level after clamping to `MIN_LEVEL..=MAX_LEVEL`.
    pub level: u32,
    /// How many bytes behind the cursor are searched.
    pub window: usize,
}

/// Map a level to its search window.
///
/// `window = 0x10E0 * level / 9 - 0xE0`: level 1 searches 256 bytes,
/// level 9 the full 4096. Out-of-range levels are clamped.
pub fn config_for_level(level: u32) -> SearchConfig {
    let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
    let window = (0x10E0 * level as usize / 9 - 0xE0).min(MAX_DISTANCE);
    SearchConfig { level, window }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_per_level() {
        assert_eq!(config_for_level(1).window, 0x100);
        assert_eq!(config_for_level(9).window, 0x1000);
        let windows: Vec<usize> = (1..=9).map(|l| config_for_level(l).window).collect();
        assert!(windows.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn levels_are_clamped() {
        assert_eq!(config_for_level(0), config_for_level(1));
        assert_eq!(config_for_level(42), config_for_level(9));
        assert_eq!(config_for_level(0).level, 1);
    }
}
