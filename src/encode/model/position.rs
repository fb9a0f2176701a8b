// src/encode/model/position.rs

//! Structural position of a block within its channel's raster.
//!
//! A block's position decides which neighbors exist when it is coded, and
//! every position owns its own probability model per channel. Only six of
//! the eight (left, above, above-right) combinations can occur in a raster
//! scan, so the positions are a closed enum rather than three booleans.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockPosition {
    /// Row 0, column 0: no neighbors.
    Corner,
    /// Row 0, any later column: left neighbor only.
    TopEdge,
    /// Later rows of a one-block-wide channel: above neighbor only.
    SingleColumn,
    /// First column of a later row: above and above-right.
    MidLeft,
    /// Interior of a later row: left, above and above-right.
    Middle,
    /// Last column of a later row: left and above.
    MidRight,
}

impl BlockPosition {
    pub const COUNT: usize = 6;
    pub const ALL: [BlockPosition; BlockPosition::COUNT] = [
        BlockPosition::Corner,
        BlockPosition::TopEdge,
        BlockPosition::SingleColumn,
        BlockPosition::MidLeft,
        BlockPosition::Middle,
        BlockPosition::MidRight,
    ];

    /// Classifies the block at (`row`, `column`) of a channel `width` blocks wide.
    ///
    /// # Panics
    /// If `column >= width`.
    pub fn classify(row: usize, column: usize, width: usize) -> BlockPosition {
        assert!(column < width, "column {} outside row of width {}", column, width);
        match (row, column) {
            (0, 0) => BlockPosition::Corner,
            (0, _) => BlockPosition::TopEdge,
            _ if width == 1 => BlockPosition::SingleColumn,
            (_, 0) => BlockPosition::MidLeft,
            _ if column + 1 == width => BlockPosition::MidRight,
            _ => BlockPosition::Middle,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn has_left(self) -> bool {
        matches!(
            self,
            BlockPosition::TopEdge | BlockPosition::Middle | BlockPosition::MidRight
        )
    }

    #[inline]
    pub fn has_above(self) -> bool {
        !matches!(self, BlockPosition::Corner | BlockPosition::TopEdge)
    }

    #[inline]
    pub fn has_above_right(self) -> bool {
        matches!(self, BlockPosition::MidLeft | BlockPosition::Middle)
    }
}

impl fmt::Display for BlockPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockPosition::Corner => "corner",
            BlockPosition::TopEdge => "top",
            BlockPosition::SingleColumn => "width_one",
            BlockPosition::MidLeft => "midleft",
            BlockPosition::Middle => "middle",
            BlockPosition::MidRight => "midright",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BlockPosition::*;

    fn row_positions(row: usize, width: usize) -> Vec<BlockPosition> {
        (0..width).map(|col| BlockPosition::classify(row, col, width)).collect()
    }

    #[test]
    fn test_single_block_is_corner() {
        assert_eq!(row_positions(0, 1), vec![Corner]);
    }

    #[test]
    fn test_two_column_rows() {
        assert_eq!(row_positions(0, 2), vec![Corner, TopEdge]);
        assert_eq!(row_positions(1, 2), vec![MidLeft, MidRight]);
    }

    #[test]
    fn test_wide_rows() {
        assert_eq!(row_positions(0, 4), vec![Corner, TopEdge, TopEdge, TopEdge]);
        assert_eq!(row_positions(3, 4), vec![MidLeft, Middle, Middle, MidRight]);
    }

    #[test]
    fn test_width_one_override() {
        for row in 1..20 {
            assert_eq!(BlockPosition::classify(row, 0, 1), SingleColumn);
        }
    }

    #[test]
    fn test_classification_is_total() {
        for width in 1..12 {
            for row in 0..6 {
                for col in 0..width {
                    let p = BlockPosition::classify(row, col, width);
                    assert!(BlockPosition::ALL.contains(&p));
                    if width == 1 {
                        assert!(!matches!(p, MidLeft | Middle | MidRight));
                    }
                    assert_eq!(p.has_left(), col > 0);
                    assert_eq!(p.has_above(), row > 0);
                    assert_eq!(p.has_above_right(), row > 0 && col + 1 < width);
                }
            }
        }
    }

    #[test]
    fn test_indices_are_distinct() {
        for (i, p) in BlockPosition::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
    }

    #[test]
    #[should_panic]
    fn test_column_outside_row_panics() {
        BlockPosition::classify(0, 3, 3);
    }
}
