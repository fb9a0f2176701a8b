// src/encode/tokens/serialize.rs

use crate::encode::model::context::{
    Neighbors, bit_length, edge_count_bucket, edge_magnitude_bucket, edge_threshold_bits,
    interior_magnitude_bucket, neighbor_nonzero_count, num_nonzeros_bucket, predict_dc,
    remaining_bucket, sign_context,
};
use crate::encode::model::tables::ProbabilityTables;
use crate::encode::observer::{ContextObserver, TokenClass};
use crate::encode::vp8::{BoolEncoder, Branch};
use crate::image::block::{
    CoefficientBlock, EdgeDirection, INTERIOR_COUNT, INTERIOR_ORDER, QuantizationTable,
};

/// Codes `value` on a binary tree of branches, most significant bit first.
#[inline]
fn encode_tree(encoder: &mut BoolEncoder, branches: &mut [Branch], value: usize, bits: usize) {
    let mut node = 1;
    for i in (0..bits).rev() {
        let bit = (value >> i) & 1 == 1;
        encoder.put(bit, &mut branches[node]);
        node = node * 2 + bit as usize;
    }
}

/// Codes `value` in unary; the terminator is implied when `value == branches.len()`.
#[inline]
fn encode_unary(encoder: &mut BoolEncoder, branches: &mut [Branch], value: usize) {
    for (i, branch) in branches.iter_mut().enumerate() {
        let bit = value > i;
        encoder.put(bit, branch);
        if !bit {
            break;
        }
    }
}

/// Codes the low `bits` bits of `magnitude`, most significant first.
#[inline]
fn encode_residual(
    encoder: &mut BoolEncoder,
    branches: &mut [Branch],
    magnitude: u32,
    bits: usize,
) {
    for i in (0..bits).rev() {
        encoder.put((magnitude >> i) & 1 == 1, &mut branches[i]);
    }
}

/// Emits the modeled decisions describing all 64 coefficients of `block`.
///
/// Coding order: the 7x7 nonzero count and zero flags, the DC delta, the 7x7
/// magnitudes and signs, then the first row and first column. The branches
/// of `tables` adapt as they are used.
pub fn serialize_tokens<O: ContextObserver>(
    block: &CoefficientBlock,
    neighbors: &Neighbors,
    tables: &mut ProbabilityTables,
    quantization: &QuantizationTable,
    encoder: &mut BoolEncoder,
    observer: &mut O,
) {
    let model = tables.model_mut();
    let raster = block.to_raster();

    let num_nonzeros = block.num_nonzeros_7x7() as usize;
    let bucket = num_nonzeros_bucket(neighbors);
    observer.context(TokenClass::Zeros7x7, 0, bucket);
    encode_tree(encoder, &mut model.num_nonzeros_7x7[bucket], num_nonzeros, 6);

    let mut remaining = num_nonzeros;
    for (k, &coord) in INTERIOR_ORDER.iter().enumerate() {
        // once every remaining position must be nonzero the flags are implied
        if remaining == 0 || remaining == INTERIOR_COUNT - k {
            break;
        }
        let coord = coord as usize;
        let is_nonzero = raster[coord] != 0;
        let agree = neighbor_nonzero_count(neighbors, coord);
        observer.context(TokenClass::ZeroFlag7x7, coord, agree);
        encoder.put(is_nonzero, &mut model.zero_flag_7x7[remaining_bucket(remaining)][k][agree]);
        if is_nonzero {
            remaining -= 1;
        }
    }

    let dc = predict_dc(neighbors);
    let delta = block.dc() as i32 - dc.predicted;
    let magnitude = delta.unsigned_abs();
    let length = bit_length(magnitude);
    observer.context(TokenClass::ExpDc, 0, dc.bucket);
    encode_unary(encoder, &mut model.exponent_dc[dc.bucket], length);
    if length > 0 {
        observer.context(TokenClass::ResDc, 0, dc.bucket);
        encode_residual(encoder, &mut model.residual_dc[dc.bucket], magnitude, length - 1);
        observer.context(TokenClass::SignDc, 0, dc.bucket);
        encoder.put(delta < 0, &mut model.sign_dc[dc.bucket]);
    }

    for (k, &coord) in INTERIOR_ORDER.iter().enumerate() {
        let coord = coord as usize;
        let value = raster[coord];
        if value == 0 {
            continue;
        }
        let magnitude = value.unsigned_abs() as u32;
        let length = bit_length(magnitude);
        let bucket = interior_magnitude_bucket(neighbors, &raster, coord);
        observer.context(TokenClass::Exp7x7, coord, bucket);
        encode_unary(encoder, &mut model.exponent_7x7[k][bucket], length - 1);
        observer.context(TokenClass::Res7x7, coord, k);
        encode_residual(encoder, &mut model.residual_7x7[k], magnitude, length - 1);
        let sign = sign_context(neighbors.left, coord);
        observer.context(TokenClass::Sign7x7, coord, sign);
        encoder.put(value < 0, &mut model.sign_7x7[k][sign]);
    }

    for direction in EdgeDirection::ALL {
        let d = direction.index();
        let count = block.num_nonzeros_edge(direction) as usize;
        let bucket = edge_count_bucket(num_nonzeros);
        let class = match direction {
            EdgeDirection::Row => TokenClass::Zeros1x8,
            EdgeDirection::Column => TokenClass::Zeros8x1,
        };
        observer.context(class, 0, bucket);
        encode_tree(encoder, &mut model.num_nonzeros_edge[d][bucket], count, 3);

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
            let value = raster[coord];
            let magnitude = value.unsigned_abs() as u32;
            let length = bit_length(magnitude);
            let bucket = edge_magnitude_bucket(neighbors, coord);
            observer.context(TokenClass::Exp8, coord, bucket);
            encode_unary(encoder, &mut model.exponent_edge[e][bucket], length);
            if length == 0 {
                continue;
            }
            remaining -= 1;

            let thresh = (length - 1).min(edge_threshold_bits(quantization.at_raster(coord)));
            observer.context(TokenClass::Thresh8, coord, thresh);
            let low_bits = length - 1 - thresh;
            let mut node = 1;
            for i in (low_bits..length - 1).rev() {
                let bit = (magnitude >> i) & 1 == 1;
                encoder.put(bit, &mut model.threshold_edge[e][length - 1][node]);
                node = node * 2 + bit as usize;
            }
            observer.context(TokenClass::Res8, coord, e);
            encode_residual(encoder, &mut model.residual_edge[e], magnitude, low_bits);

            let sign = sign_context(sign_neighbor, coord);
            observer.context(TokenClass::Sign8, coord, sign);
            encoder.put(value < 0, &mut model.sign_edge[e][sign]);
        }
    }
}
