// SPDX-License-Identifier: AGPL-3.0-only

//! Seeded PRNG for reproducible mode sampling.
//!
//! xoshiro256++ with SplitMix64 seed expansion. The generator is a local
//! of each sampling call — no global state survives between calls, so the
//! same seed yields bit-identical output independent of call history, and
//! concurrent sampling with independent seeds needs no locking.
//!
//! # Provenance
//!
//! - Blackman & Vigna (2021), "Scrambled linear pseudorandom number
//!   generators", ACM TOMS 47.4 (xoshiro256++)
//! - Steele, Lea & Flood (2014), OOPSLA (SplitMix64 seeding)

use crate::tolerances::DIVISION_GUARD;

/// xoshiro256++ generator, seeded via SplitMix64.
pub struct Xoshiro256pp {
    s: [u64; 4],
}

impl Xoshiro256pp {
    /// Expand an integer seed into the 256-bit state.
    ///
    /// SplitMix64 guarantees a well-mixed nonzero state for every seed,
    /// including 0.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        for slot in &mut s {
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            *slot = z ^ (z >> 31);
        }
        Self { s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);
        let t = self.s[1] << 17;
        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];
        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);
        result
    }

    /// Uniform draw in [0, 1) with the full 53 bits of f64 mantissa.
    pub fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Standard normal draw via the Box–Muller transform.
    ///
    /// The guard on `u1` keeps `ln` finite should a draw land exactly on 0.
    pub fn standard_normal(&mut self) -> f64 {
        let u1 = self.uniform().max(DIVISION_GUARD);
        let u2 = self.uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}
