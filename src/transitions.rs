//! Transition tables: neighbor bit patterns to sprite variant offsets.
//!
//! A table maps a 9-bit [`NeighborMask`] to a signed offset added to a
//! class's base sprite index. Tables come from one of two sources, chosen
//! per deployment:
//! - a text file, one rule group per line: `k1 k2 ... kn value`
//! - the built-in constant table ([`TransitionTable::constant`])
//!
//! Masks with no rule resolve to 0, meaning "draw the base sprite".

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::info;
use thiserror::Error;

/// Transition rules shipped with the crate, in the text format.
pub const DEFAULT_TRANSITIONS: &str = include_str!("../assets/tile_transitions.txt");

// =============================================================================
// NEIGHBOR MASK
// =============================================================================

/// Which cells of a 3x3 block hold the transition target class.
///
/// Bit `(dx + 1) * 3 + (dy + 1)` is set when the cell at offset `(dx, dy)`
/// matches. Bit 4 is the center cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NeighborMask(u16);

impl NeighborMask {
    /// Number of positions in the block, center included.
    pub const POSITIONS: usize = 9;
    /// Largest representable mask.
    pub const MAX: u16 = (1 << Self::POSITIONS) - 1;

    pub fn new(bits: u16) -> Self {
        Self(bits & Self::MAX)
    }

    /// Bit index for a neighbor offset, both components in `-1..=1`.
    pub fn bit_index(dx: i32, dy: i32) -> usize {
        debug_assert!((-1..=1).contains(&dx) && (-1..=1).contains(&dy));
        ((dx + 1) * 3 + (dy + 1)) as usize
    }

    /// Build a mask by testing every offset of the 3x3 block.
    pub fn from_fn(mut matches: impl FnMut(i32, i32) -> bool) -> Self {
        let mut bits = 0u16;
        for dx in -1..=1 {
            for dy in -1..=1 {
                if matches(dx, dy) {
                    bits |= 1 << Self::bit_index(dx, dy);
                }
            }
        }
        Self(bits)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn is_set(self, dx: i32, dy: i32) -> bool {
        self.0 & (1 << Self::bit_index(dx, dy)) != 0
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Failure to load a transition table. Always fatal: generation never runs
/// with a partially loaded or defaulted table.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("failed to read transition file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected at least one key and a value, found {found} token(s)")]
    MissingValue { line: usize, found: usize },
    #[error("line {line}: '{token}' is not an integer")]
    InvalidToken { line: usize, token: String },
    #[error("line {line}: mask {key} is outside 0..={max}", max = NeighborMask::MAX)]
    KeyOutOfRange { line: usize, key: i64 },
    #[error("line {line}: mask {key} already defined on line {first_line}")]
    DuplicateKey { line: usize, key: u16, first_line: usize },
}

// =============================================================================
// TRANSITION TABLE
// =============================================================================

// Hand-authored variants for a 3x3 sprite block laid out around the base
// sprite: -4 -3 -2 / -1 0 +1 / +2 +3 +4 (top row = +dy side).
const CONSTANT_RULES: [(i32, &[u16]); 8] = [
    // Top-left corner: left (2) and top (32) edges, diagonal 4
    (-4, &[4, 34, 38, 39, 294]),
    // Top edge
    (-3, &[32, 36, 288, 292]),
    // Top-right corner: right (128) and top (32) edges, diagonal 256
    (-2, &[256, 160, 416, 480, 420]),
    // Left edge
    (-1, &[2, 3, 6, 7]),
    // Right edge
    (1, &[128, 192, 384, 448]),
    // Bottom-left corner: left (2) and bottom (8) edges, diagonal 1
    (2, &[1, 10, 11, 15, 75]),
    // Bottom edge
    (3, &[8, 9, 72, 73]),
    // Bottom-right corner: right (128) and bottom (8) edges, diagonal 64
    (4, &[64, 136, 200, 456, 201]),
];

/// Immutable mapping from neighbor mask to sprite variant offset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionTable {
    offsets: HashMap<NeighborMask, i32>,
}

impl TransitionTable {
    /// The built-in rule set.
    pub fn constant() -> Self {
        let mut offsets = HashMap::new();
        for (offset, masks) in CONSTANT_RULES {
            for &mask in masks {
                offsets.insert(NeighborMask::new(mask), offset);
            }
        }
        Self { offsets }
    }

    /// Rules embedded from `assets/tile_transitions.txt`.
    pub fn embedded() -> Result<Self, TransitionError> {
        Self::parse(DEFAULT_TRANSITIONS)
    }

    /// Load rules from a transition file on disk.
    pub fn load(path: &Path) -> Result<Self, TransitionError> {
        let text = fs::read_to_string(path)?;
        let table = Self::parse(&text)?;
        info!("loaded {} transition rules from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parse the text format. Whitespace-only lines are skipped; every other
    /// line needs at least one key followed by the value.
    pub fn parse(text: &str) -> Result<Self, TransitionError> {
        let mut offsets = HashMap::new();
        let mut defined_on: HashMap<NeighborMask, usize> = HashMap::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let tokens: Vec<&str> = raw.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            if tokens.len() < 2 {
                return Err(TransitionError::MissingValue { line, found: tokens.len() });
            }

            let numbers = tokens
                .iter()
                .map(|t| {
                    t.parse::<i64>().map_err(|_| TransitionError::InvalidToken {
                        line,
                        token: (*t).to_string(),
                    })
                })
                .collect::<Result<Vec<i64>, _>>()?;

            let (keys, value) = numbers.split_at(numbers.len() - 1);
            let value = i32::try_from(value[0]).map_err(|_| TransitionError::InvalidToken {
                line,
                token: tokens[tokens.len() - 1].to_string(),
            })?;

            for &key in keys {
                if !(0..=NeighborMask::MAX as i64).contains(&key) {
                    return Err(TransitionError::KeyOutOfRange { line, key });
                }
                let mask = NeighborMask::new(key as u16);
                if let Some(&first_line) = defined_on.get(&mask) {
                    return Err(TransitionError::DuplicateKey { line, key: mask.bits(), first_line });
                }
                defined_on.insert(mask, line);
                offsets.insert(mask, value);
            }
        }

        Ok(Self { offsets })
    }

    /// Variant offset for a mask, 0 when no rule matches.
    pub fn resolve(&self, mask: NeighborMask) -> i32 {
        self.offsets.get(&mask).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Iterate over all `(mask, offset)` rules in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (NeighborMask, i32)> + '_ {
        self.offsets.iter().map(|(&m, &o)| (m, o))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bit_layout() {
        assert_eq!(NeighborMask::bit_index(-1, -1), 0);
        assert_eq!(NeighborMask::bit_index(-1, 0), 1);
        assert_eq!(NeighborMask::bit_index(0, 0), 4);
        assert_eq!(NeighborMask::bit_index(0, 1), 5);
        assert_eq!(NeighborMask::bit_index(1, 1), 8);

        let left = NeighborMask::from_fn(|dx, dy| dx == -1 && dy == 0);
        assert_eq!(left.bits(), 2);
        assert!(left.is_set(-1, 0));
        assert!(!left.is_set(1, 0));
    }

    #[test]
    fn test_parse_maps_every_key_to_line_value() {
        let table = TransitionTable::parse("2 3 6 -1\n128 1\n").unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.resolve(NeighborMask::new(2)), -1);
        assert_eq!(table.resolve(NeighborMask::new(3)), -1);
        assert_eq!(table.resolve(NeighborMask::new(6)), -1);
        assert_eq!(table.resolve(NeighborMask::new(128)), 1);
    }

    #[test]
    fn test_absent_masks_resolve_to_zero() {
        let table = TransitionTable::parse("2 -1").unwrap();
        for bits in 0..=NeighborMask::MAX {
            if bits != 2 {
                assert_eq!(table.resolve(NeighborMask::new(bits)), 0);
            }
        }
        assert_eq!(TransitionTable::constant().resolve(NeighborMask::new(511)), 0);
        assert_eq!(TransitionTable::constant().resolve(NeighborMask::new(0)), 0);
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let err = TransitionTable::parse("2 3 -1\n5 3 1").unwrap_err();
        match err {
            TransitionError::DuplicateKey { line, key, first_line } => {
                assert_eq!((line, key, first_line), (2, 3, 1));
            }
            other => panic!("unexpected error: {other}"),
        }

        // Repeats on the same line are just as ambiguous
        assert!(matches!(
            TransitionTable::parse("7 7 2"),
            Err(TransitionError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_malformed_lines_are_rejected() {
        assert!(matches!(
            TransitionTable::parse("2 -1\n42\n"),
            Err(TransitionError::MissingValue { line: 2, found: 1 })
        ));
        assert!(matches!(
            TransitionTable::parse("2 x -1"),
            Err(TransitionError::InvalidToken { line: 1, .. })
        ));
        assert!(matches!(
            TransitionTable::parse("2 3.5"),
            Err(TransitionError::InvalidToken { .. })
        ));
        assert!(matches!(
            TransitionTable::parse("512 1"),
            Err(TransitionError::KeyOutOfRange { key: 512, .. })
        ));
        assert!(matches!(
            TransitionTable::parse("-3 1"),
            Err(TransitionError::KeyOutOfRange { key: -3, .. })
        ));
    }

    #[test]
    fn test_blank_lines_and_crlf_are_tolerated() {
        let table = TransitionTable::parse("2 3 -1\r\n\r\n   \n128 1\r\n").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.resolve(NeighborMask::new(128)), 1);
    }

    #[test]
    fn test_constant_table_shape() {
        let table = TransitionTable::constant();
        assert_eq!(table.len(), 36);

        let mut buckets: Vec<i32> = table.iter().map(|(_, o)| o).collect();
        buckets.sort();
        buckets.dedup();
        assert_eq!(buckets, vec![-4, -3, -2, -1, 1, 2, 3, 4]);

        // No rule references the center cell
        assert!(table.iter().all(|(m, _)| !m.is_set(0, 0)));
    }

    #[test]
    fn test_embedded_file_matches_constant_table() {
        let embedded = TransitionTable::embedded().unwrap();
        assert_eq!(embedded, TransitionTable::constant());
    }

    #[test]
    fn test_load_from_disk_is_idempotent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1 10 11 2").unwrap();
        writeln!(file, "32 36 -3").unwrap();

        let first = TransitionTable::load(file.path()).unwrap();
        let second = TransitionTable::load(file.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.resolve(NeighborMask::new(10)), 2);
        assert_eq!(first.resolve(NeighborMask::new(36)), -3);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TransitionTable::load(&dir.path().join("nope.txt"));
        assert!(matches!(result, Err(TransitionError::Io(_))));
    }
}
