// src/image/block.rs

//! Quantized DCT coefficient blocks and the tables used to address them.
//!
//! Blocks keep their coefficients in JPEG zigzag order, exactly as they come
//! out of the Huffman decoder. The entropy model mostly reasons in raster
//! coordinates (`y * 8 + x`), so both orders are exposed.

use std::fmt;

/// Raster index for each zigzag index.
pub const ZIGZAG_TO_RASTER: [u8; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27,
    20, 13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58,
    59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// Zigzag index for each raster index.
pub const RASTER_TO_ZIGZAG: [u8; 64] = invert(&ZIGZAG_TO_RASTER);

/// Number of coefficients in the 7x7 interior (x > 0 and y > 0).
pub const INTERIOR_COUNT: usize = 49;

/// Raster indices of the 7x7 interior, in zigzag order.
pub const INTERIOR_ORDER: [u8; INTERIOR_COUNT] = interior_order();

const fn invert(table: &[u8; 64]) -> [u8; 64] {
    let mut out = [0u8; 64];
    let mut i = 0;
    while i < 64 {
        out[table[i] as usize] = i as u8;
        i += 1;
    }
    out
}

const fn interior_order() -> [u8; INTERIOR_COUNT] {
    let mut out = [0u8; INTERIOR_COUNT];
    let mut n = 0;
    let mut zz = 0;
    while zz < 64 {
        let coord = ZIGZAG_TO_RASTER[zz];
        if coord % 8 != 0 && coord / 8 != 0 {
            out[n] = coord;
            n += 1;
        }
        zz += 1;
    }
    out
}

/// One of the two 7-coefficient edge strips of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// The first row (1x8): horizontal frequencies, raster indices 1..=7.
    Row,
    /// The first column (8x1): vertical frequencies, raster indices 8, 16, .., 56.
    Column,
}

impl EdgeDirection {
    pub const ALL: [EdgeDirection; 2] = [EdgeDirection::Row, EdgeDirection::Column];

    pub fn index(self) -> usize {
        match self {
            EdgeDirection::Row => 0,
            EdgeDirection::Column => 1,
        }
    }

    /// Raster index of the `step`-th coefficient (1..=7) along this edge.
    #[inline]
    pub fn coord(self, step: usize) -> usize {
        debug_assert!((1..8).contains(&step));
        match self {
            EdgeDirection::Row => step,
            EdgeDirection::Column => step * 8,
        }
    }
}

/// 64 quantized coefficients for one 8x8 region of one channel.
#[derive(Clone, PartialEq, Eq)]
pub struct CoefficientBlock {
    zigzag: [i16; 64],
    coded_length: u8,
}

impl CoefficientBlock {
    /// Creates a block from coefficients in zigzag order (index 0 is DC).
    pub fn from_zigzag(zigzag: [i16; 64]) -> Self {
        let mut block = Self { zigzag, coded_length: 0 };
        block.recalculate_coded_length();
        block
    }

    /// Creates a block from coefficients in raster order.
    pub fn from_raster(raster: &[i16; 64]) -> Self {
        let mut zigzag = [0i16; 64];
        for (zz, &coord) in ZIGZAG_TO_RASTER.iter().enumerate() {
            zigzag[zz] = raster[coord as usize];
        }
        Self::from_zigzag(zigzag)
    }

    /// An all-zero block.
    pub fn zeroed() -> Self {
        Self::from_zigzag([0; 64])
    }

    fn recalculate_coded_length(&mut self) {
        self.coded_length = self
            .zigzag
            .iter()
            .rposition(|&c| c != 0)
            .map_or(0, |last| last as u8 + 1);
    }

    /// Zigzag index of the last nonzero coefficient plus one; 0 for an empty block.
    pub fn coded_length(&self) -> u8 {
        self.coded_length
    }

    pub fn zigzag(&self) -> &[i16; 64] {
        &self.zigzag
    }

    /// Coefficient at raster index `coord` (`y * 8 + x`).
    #[inline]
    pub fn raster(&self, coord: usize) -> i16 {
        self.zigzag[RASTER_TO_ZIGZAG[coord] as usize]
    }

    pub fn to_raster(&self) -> [i16; 64] {
        let mut raster = [0i16; 64];
        for (coord, value) in raster.iter_mut().enumerate() {
            *value = self.raster(coord);
        }
        raster
    }

    #[inline]
    pub fn dc(&self) -> i16 {
        self.zigzag[0]
    }

    /// Number of nonzero coefficients in the 7x7 interior.
    pub fn num_nonzeros_7x7(&self) -> u8 {
        INTERIOR_ORDER
            .iter()
            .filter(|&&coord| self.raster(coord as usize) != 0)
            .count() as u8
    }

    /// Number of nonzero coefficients along an edge strip, DC excluded.
    pub fn num_nonzeros_edge(&self, direction: EdgeDirection) -> u8 {
        (1..8)
            .filter(|&step| self.raster(direction.coord(step)) != 0)
            .count() as u8
    }
}

impl Default for CoefficientBlock {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for CoefficientBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoefficientBlock")
            .field("dc", &self.dc())
            .field("coded_length", &self.coded_length)
            .field("zigzag", &&self.zigzag[..])
            .finish()
    }
}

/// Quantizer step sizes for one channel, in zigzag order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizationTable([u16; 64]);

impl QuantizationTable {
    pub fn new(zigzag: [u16; 64]) -> Self {
        Self(zigzag)
    }

    /// A table with the same step size everywhere.
    pub fn flat(step: u16) -> Self {
        Self([step; 64])
    }

    #[inline]
    pub fn at_zigzag(&self, zz: usize) -> u16 {
        self.0[zz]
    }

    #[inline]
    pub fn at_raster(&self, coord: usize) -> u16 {
        self.0[RASTER_TO_ZIGZAG[coord] as usize]
    }
}

impl Default for QuantizationTable {
    fn default() -> Self {
        Self::flat(1)
    }
}
