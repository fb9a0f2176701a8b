// src/encode/vp8/branch.rs

//! Count-based adaptive probability for a single binary decision.

use bytemuck::{Pod, Zeroable};

/// The adaptive state behind one modeled binary decision.
///
/// Two saturating counters record how often a 0 and a 1 were seen; the cached
/// `probability` is the chance of a 0 scaled to 256. It is kept within
/// `1..=255` so neither outcome ever becomes uncodable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Branch {
    counts: [u8; 2],
    probability: u8,
}

impl Branch {
    pub const fn new() -> Self {
        Self { counts: [1, 1], probability: 128 }
    }

    /// Probability of a 0 bit, out of 256.
    #[inline(always)]
    pub fn probability(&self) -> u8 {
        self.probability
    }

    /// Observation counters for 0 and 1.
    pub fn counts(&self) -> [u8; 2] {
        self.counts
    }

    /// Records one observation and moves the probability towards it.
    #[inline(always)]
    pub fn record_obs_and_update(&mut self, bit: bool) {
        let obs = bit as usize;
        if self.counts[obs] == u8::MAX {
            // halve both, rounding up so neither counter reaches zero
            self.counts[0] = (self.counts[0] >> 1) + (self.counts[0] & 1);
            self.counts[1] = (self.counts[1] >> 1) + (self.counts[1] & 1);
        }
        self.counts[obs] += 1;
        self.optimize();
    }

    /// Recomputes the cached probability from the counters.
    #[inline(always)]
    pub fn optimize(&mut self) {
        let zeros = self.counts[0] as u32;
        let total = zeros + self.counts[1] as u32;
        self.probability = ((zeros << 8) / total).clamp(1, 255) as u8;
    }

    /// Repairs counters that cannot come from adaptation (zero counts after a raw load).
    pub fn sanitize(&mut self) {
        self.counts[0] = self.counts[0].max(1);
        self.counts[1] = self.counts[1].max(1);
        self.optimize();
    }
}

impl Default for Branch {
    fn default() -> Self {
        Self::new()
    }
}
