// src/encode/vp8/bool_encoder.rs

use super::branch::Branch;

/// Adaptive binary arithmetic encoder (the VP8 boolean coder of RFC 6386).
///
/// Output accumulates in memory: a carry out of `bottom` may have to ripple
/// back into bytes that were already emitted.
pub struct BoolEncoder {
    output: Vec<u8>,
    range: u32,     // interval width, normalized into 128..=255
    bottom: u32,    // low end of the interval, 24 pending bits plus carry
    bit_count: i32, // shifts left before the next byte is emitted
}

impl BoolEncoder {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        BoolEncoder {
            output: Vec::with_capacity(capacity),
            range: 255,
            bottom: 0,
            bit_count: 24,
        }
    }

    /// Encodes `bit` against `branch` and adapts the branch.
    #[inline(always)]
    pub fn put(&mut self, bit: bool, branch: &mut Branch) {
        self.put_with_probability(bit, branch.probability());
        branch.record_obs_and_update(bit);
    }

    /// Encodes `bit` with a fixed probability of zero (`probability / 256`).
    #[inline(always)]
    pub fn put_with_probability(&mut self, bit: bool, probability: u8) {
        let split = 1 + (((self.range - 1) * probability as u32) >> 8);
        if bit {
            self.bottom = self.bottom.wrapping_add(split);
            self.range -= split;
        } else {
            self.range = split;
        }
        while self.range < 128 {
            self.range <<= 1;
            if self.bottom & (1 << 31) != 0 {
                self.propagate_carry();
            }
            self.bottom <<= 1;
            self.bit_count -= 1;
            if self.bit_count == 0 {
                self.output.push((self.bottom >> 24) as u8);
                self.bottom &= 0x00ff_ffff;
                self.bit_count = 8;
            }
        }
    }

    fn propagate_carry(&mut self) {
        for byte in self.output.iter_mut().rev() {
            if *byte == 0xff {
                *byte = 0;
            } else {
                *byte += 1;
                return;
            }
        }
    }

    /// Bytes emitted so far; the final size is only known after `finish`.
    pub fn tell_bytes(&self) -> usize {
        self.output.len()
    }

    /// Flushes the pending interval and returns the complete stream.
    pub fn finish(mut self) -> Vec<u8> {
        let mut c = self.bit_count;
        let mut v = self.bottom;
        if v & (1u32 << (32 - c)) != 0 {
            self.propagate_carry();
        }
        v <<= c & 7;
        c >>= 3;
        while c > 0 {
            v <<= 8;
            c -= 1;
        }
        for _ in 0..4 {
            self.output.push((v >> 24) as u8);
            v <<= 8;
        }
        self.output
    }
}

impl Default for BoolEncoder {
    fn default() -> Self {
        Self::new()
    }
}
