// src/encode/vp8/bool_decoder.rs

use super::branch::Branch;

/// Reads back a stream produced by [`BoolEncoder`](super::BoolEncoder).
///
/// Reading past the end of the input yields zero bytes, which is how the
/// encoder's flush pads the final interval.
pub struct BoolDecoder<'a> {
    input: &'a [u8],
    pos: usize,
    value: u32,
    range: u32,
    bit_count: i32,
}

impl<'a> BoolDecoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        let mut decoder = BoolDecoder {
            input,
            pos: 0,
            value: 0,
            range: 255,
            bit_count: 0,
        };
        decoder.value = ((decoder.next_byte() as u32) << 8) | decoder.next_byte() as u32;
        decoder
    }

    #[inline(always)]
    fn next_byte(&mut self) -> u8 {
        let byte = self.input.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        byte
    }

    /// Decodes one bit against `branch` and adapts the branch.
    #[inline(always)]
    pub fn get(&mut self, branch: &mut Branch) -> bool {
        let bit = self.get_with_probability(branch.probability());
        branch.record_obs_and_update(bit);
        bit
    }

    /// Decodes one bit with a fixed probability of zero (`probability / 256`).
    #[inline(always)]
    pub fn get_with_probability(&mut self, probability: u8) -> bool {
        let split = 1 + (((self.range - 1) * probability as u32) >> 8);
        let big_split = split << 8;
        let bit = if self.value >= big_split {
            self.range -= split;
            self.value -= big_split;
            true
        } else {
            self.range = split;
            false
        };
        while self.range < 128 {
            self.value <<= 1;
            self.range <<= 1;
            self.bit_count += 1;
            if self.bit_count == 8 {
                self.bit_count = 0;
                self.value |= self.next_byte() as u32;
            }
        }
        bit
    }
}
