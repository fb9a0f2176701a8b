// src/encode/tokens/deserialize.rs

use crate::encode::model::context::{
    Neighbors, edge_count_bucket, edge_magnitude_bucket, edge_threshold_bits,
    interior_magnitude_bucket, neighbor_nonzero_count, num_nonzeros_bucket, predict_dc,
    remaining_bucket, sign_context,
};
use crate::encode::model::tables::ProbabilityTables;
use crate::encode::vp8::{BoolDecoder, Branch};
use crate::image::block::{
    CoefficientBlock, EdgeDirection, INTERIOR_COUNT, INTERIOR_ORDER, QuantizationTable,
};
use bitvec::prelude::*;

#[inline]
fn decode_tree(decoder: &mut BoolDecoder, branches: &mut [Branch], bits: usize) -> usize {
    let mut node = 1;
    for _ in 0..bits {
        node = node * 2 + decoder.get(&mut branches[node]) as usize;
    }
    node - (1 << bits)
}

#[inline]
fn decode_unary(decoder: &mut BoolDecoder, branches: &mut [Branch]) -> usize {
    let mut value = 0;
    while value < branches.len() && decoder.get(&mut branches[value]) {
        value += 1;
    }
    value
}

#[inline]
fn decode_residual(
    decoder: &mut BoolDecoder,
    branches: &mut [Branch],
    mut magnitude: u32,
    bits: usize,
) -> u32 {
    for i in (0..bits).rev() {
        if decoder.get(&mut branches[i]) {
            magnitude |= 1 << i;
        }
    }
    magnitude
}

#[inline]
fn signed(magnitude: u32, negative: bool) -> i16 {
    if negative {
        (magnitude as i32).wrapping_neg() as i16
    } else {
        magnitude as i16
    }
}

/// Reads back one block written by [`serialize_tokens`](super::serialize_tokens).
///
/// `neighbors`, `tables` and `quantization` must be in the state the encoder
/// saw for this block; the branches adapt exactly as they did there.
pub fn deserialize_tokens(
    neighbors: &Neighbors,
    tables: &mut ProbabilityTables,
    quantization: &QuantizationTable,
    decoder: &mut BoolDecoder,
) -> CoefficientBlock {
    let model = tables.model_mut();
    let mut raster = [0i16; 64];

    let bucket = num_nonzeros_bucket(neighbors);
    // a corrupt stream may claim more than 49; the flags below cap it
    let num_nonzeros =
        decode_tree(decoder, &mut model.num_nonzeros_7x7[bucket], 6).min(INTERIOR_COUNT);

    let mut nonzero: BitArr!(for INTERIOR_COUNT, in u64, Lsb0) = BitArray::ZERO;
    let mut remaining = num_nonzeros;
    for (k, &coord) in INTERIOR_ORDER.iter().enumerate() {
        if remaining == 0 {
            break;
        }
        if remaining == INTERIOR_COUNT - k {
            nonzero[k..INTERIOR_COUNT].fill(true);
            break;
        }
        let agree = neighbor_nonzero_count(neighbors, coord as usize);
        if decoder.get(&mut model.zero_flag_7x7[remaining_bucket(remaining)][k][agree]) {
            nonzero.set(k, true);
            remaining -= 1;
        }
    }

    let dc = predict_dc(neighbors);
    let length = decode_unary(decoder, &mut model.exponent_dc[dc.bucket]);
    let delta = if length > 0 {
        let branches = &mut model.residual_dc[dc.bucket];
        let magnitude = decode_residual(decoder, branches, 1 << (length - 1), length - 1);
        if decoder.get(&mut model.sign_dc[dc.bucket]) {
            -(magnitude as i32)
        } else {
            magnitude as i32
        }
    } else {
        0
    };
    raster[0] = dc.predicted.wrapping_add(delta) as i16;

    for k in nonzero.iter_ones() {
        let coord = INTERIOR_ORDER[k] as usize;
        let bucket = interior_magnitude_bucket(neighbors, &raster, coord);
        let length = decode_unary(decoder, &mut model.exponent_7x7[k][bucket]) + 1;
        let branches = &mut model.residual_7x7[k];
        let magnitude = decode_residual(decoder, branches, 1 << (length - 1), length - 1);
        let sign = sign_context(neighbors.left, coord);
        let negative = decoder.get(&mut model.sign_7x7[k][sign]);
        raster[coord] = signed(magnitude, negative);
    }

    for direction in EdgeDirection::ALL {
        let d = direction.index();
        let bucket = edge_count_bucket(num_nonzeros);
        let count = decode_tree(decoder, &mut model.num_nonzeros_edge[d][bucket], 3);

        let sign_neighbor = match direction {
            EdgeDirection::Row => neighbors.above,
            EdgeDirection::Column => neighbors.left,
        };
        let mut remaining = count;
        for step in 1..8 {
            if remaining == 0 {
                break;
            }
            let coord = direction.coord(step);
            let e = d * 7 + step - 1;
            let bucket = edge_magnitude_bucket(neighbors, coord);
            let length = decode_unary(decoder, &mut model.exponent_edge[e][bucket]);
            if length == 0 {
                continue;
            }
            remaining -= 1;

            let thresh = (length - 1).min(edge_threshold_bits(quantization.at_raster(coord)));
            let low_bits = length - 1 - thresh;
            let mut magnitude = 1u32 << (length - 1);
            let mut node = 1;
            for i in (low_bits..length - 1).rev() {
                let bit = decoder.get(&mut model.threshold_edge[e][length - 1][node]);
                if bit {
                    magnitude |= 1 << i;
                }
                node = node * 2 + bit as usize;
            }
            let magnitude =
                decode_residual(decoder, &mut model.residual_edge[e], magnitude, low_bits);

            let sign = sign_context(sign_neighbor, coord);
            let negative = decoder.get(&mut model.sign_edge[e][sign]);
            raster[coord] = signed(magnitude, negative);
        }
    }

    CoefficientBlock::from_raster(&raster)
}
