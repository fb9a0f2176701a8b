// src/encode/model/context.rs

//! Context bucket derivation shared by the token serializer and deserializer.
//!
//! Every function here looks only at data the decoder already has when it
//! reaches the same decision: neighbor blocks coded earlier and, inside the
//! current block, coefficients that precede the current one in coding order.

use crate::encode::model::tables::{
    MAX_EXPONENT, NUM_DC_BUCKETS, NUM_EXPONENT_BUCKETS, NUM_REMAINING_BUCKETS,
};
use crate::image::block::CoefficientBlock;

/// The previously coded blocks around the current one.
///
/// Which of them are present is decided by the block's structural position,
/// never by looking at the store.
#[derive(Debug, Default, Clone, Copy)]
pub struct Neighbors<'a> {
    pub left: Option<&'a CoefficientBlock>,
    pub above: Option<&'a CoefficientBlock>,
    pub above_right: Option<&'a CoefficientBlock>,
}

impl<'a> Neighbors<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    fn all(&self) -> impl Iterator<Item = &'a CoefficientBlock> {
        [self.left, self.above, self.above_right].into_iter().flatten()
    }

    fn left_and_above(&self) -> impl Iterator<Item = &'a CoefficientBlock> {
        [self.left, self.above].into_iter().flatten()
    }
}

#[inline(always)]
pub fn bit_length(value: u32) -> usize {
    (u32::BITS - value.leading_zeros()) as usize
}

/// Bucket for the 7x7 nonzero count, from the neighbors' average count.
pub fn num_nonzeros_bucket(neighbors: &Neighbors) -> usize {
    let (sum, n) = neighbors
        .all()
        .fold((0u32, 0u32), |(sum, n), b| (sum + b.num_nonzeros_7x7() as u32, n + 1));
    if n == 0 {
        return 0;
    }
    match sum / n {
        0 => 0,
        1 => 1,
        2 => 2,
        3..=4 => 3,
        5..=7 => 4,
        8..=11 => 5,
        12..=17 => 6,
        18..=25 => 7,
        26..=35 => 8,
        _ => 9,
    }
}

/// Bucket for the number of interior nonzeros still to be placed (`remaining >= 1`).
#[inline]
pub fn remaining_bucket(remaining: usize) -> usize {
    debug_assert!(remaining > 0);
    remaining.min(NUM_REMAINING_BUCKETS) - 1
}

/// How many of the left/above neighbors are nonzero at raster index `coord` (0..=2).
pub fn neighbor_nonzero_count(neighbors: &Neighbors, coord: usize) -> usize {
    neighbors
        .left_and_above()
        .filter(|b| b.raster(coord) != 0)
        .count()
}

/// Magnitude bucket for an interior coefficient.
///
/// Averages the magnitude at the same position in the left and above blocks
/// with the already-coded coefficients directly left of and above `coord`
/// inside the current block (`here`, raster order).
pub fn interior_magnitude_bucket(neighbors: &Neighbors, here: &[i16; 64], coord: usize) -> usize {
    let (mut sum, mut n) = neighbors
        .left_and_above()
        .fold((0u32, 0u32), |(sum, n), b| (sum + b.raster(coord).unsigned_abs() as u32, n + 1));
    let (x, y) = (coord % 8, coord / 8);
    if x > 1 {
        sum += here[coord - 1].unsigned_abs() as u32;
        n += 1;
    }
    if y > 1 {
        sum += here[coord - 8].unsigned_abs() as u32;
        n += 1;
    }
    magnitude_bucket(sum, n)
}

/// Magnitude bucket for an edge coefficient, from the neighbors alone.
pub fn edge_magnitude_bucket(neighbors: &Neighbors, coord: usize) -> usize {
    let (sum, n) = neighbors
        .left_and_above()
        .fold((0u32, 0u32), |(sum, n), b| (sum + b.raster(coord).unsigned_abs() as u32, n + 1));
    magnitude_bucket(sum, n)
}

fn magnitude_bucket(sum: u32, n: u32) -> usize {
    if n == 0 {
        return 0;
    }
    bit_length(sum / n).min(NUM_EXPONENT_BUCKETS - 1)
}

/// Sign context of a neighbor coefficient: 0 absent or zero, 1 positive, 2 negative.
pub fn sign_context(block: Option<&CoefficientBlock>, coord: usize) -> usize {
    match block.map(|b| b.raster(coord)) {
        Some(v) if v > 0 => 1,
        Some(v) if v < 0 => 2,
        _ => 0,
    }
}

/// Bucket for an edge strip's nonzero count, from the interior count.
#[inline]
pub fn edge_count_bucket(num_nonzeros_7x7: usize) -> usize {
    (num_nonzeros_7x7 + 6) / 7
}

/// How many of the leading residual bits of an edge coefficient get the
/// threshold contexts, given the quantizer step at that position.
#[inline]
pub fn edge_threshold_bits(step: u16) -> usize {
    match step {
        0..=2 => 3,
        3..=8 => 2,
        _ => 1,
    }
}

/// DC prediction and its uncertainty bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DcPrediction {
    pub predicted: i32,
    pub bucket: usize,
}

/// Predicts the DC from the available neighbors' DC values.
///
/// The prediction is their truncating average (0 with no neighbors). The
/// bucket is the bit length of their spread when at least two are present.
pub fn predict_dc(neighbors: &Neighbors) -> DcPrediction {
    let dcs: Vec<i32> = neighbors.all().map(|b| b.dc() as i32).collect();
    if dcs.is_empty() {
        return DcPrediction { predicted: 0, bucket: 0 };
    }
    let predicted = dcs.iter().sum::<i32>() / dcs.len() as i32;
    let bucket = if dcs.len() >= 2 {
        let max = *dcs.iter().max().unwrap_or(&0);
        let min = *dcs.iter().min().unwrap_or(&0);
        bit_length((max - min) as u32).min(NUM_DC_BUCKETS - 1)
    } else {
        0
    };
    DcPrediction { predicted, bucket }
}

/// Bit length of a coefficient magnitude, which fits the AC exponent range.
#[inline]
pub fn coefficient_length(value: i16) -> usize {
    let length = bit_length(value.unsigned_abs() as u32);
    debug_assert!(length <= MAX_EXPONENT);
    length
}
