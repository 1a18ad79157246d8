//! Rolling fingerprint over a fixed-size window of bytes.
//!
//! `XCodecHash` is a polynomial rolling hash (the same family used by
//! content-defined chunkers such as rsync's weak checksum): the internal
//! state can be rebuilt from a full window via [`XCodecHash::reset`] or
//! advanced one byte at a time via [`XCodecHash::roll`], and both paths agree
//! on the resulting value for the same window contents. The raw polynomial
//! state is run through a splitmix64-style finalizer before being exposed as
//! a [`u64`] fingerprint, since the bare polynomial has weak avalanche in its
//! low bits and the fingerprint is used directly as a cache key.

use crate::{error::CodecError, segment::SEGMENT_LEN};

/// Multiplier for the rolling polynomial. Any odd constant works; this one is
/// the 64-bit FNV prime, chosen for its well-studied avalanche properties.
const BASE: u64 = 0x0000_0100_0000_01B3;

const fn base_pow(exponent: u32) -> u64 {
    let mut result: u64 = 1;
    let mut i = 0;
    while i < exponent {
        result = result.wrapping_mul(BASE);
        i += 1;
    }
    result
}

/// `BASE^(SEGMENT_LEN - 1)`, the weight of the byte leaving the window.
const LEADING_WEIGHT: u64 = base_pow(SEGMENT_LEN as u32 - 1);

/// Rolling fingerprint over exactly [`SEGMENT_LEN`] bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct XCodecHash {
    state: u64,
}

impl XCodecHash {
    /// Initialises the hash from a full window of bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidWindowLength`] if `window` is not exactly
    /// [`SEGMENT_LEN`] bytes.
    pub fn reset(window: &[u8]) -> Result<Self, CodecError> {
        if window.len() != SEGMENT_LEN {
            return Err(CodecError::InvalidWindowLength { actual: window.len() });
        }
        let mut state: u64 = 0;
        for &byte in window {
            state = state.wrapping_mul(BASE).wrapping_add(u64::from(byte));
        }
        Ok(Self { state })
    }

    /// Advances the window by one byte: `out_byte` leaves, `in_byte` enters.
    #[must_use]
    pub fn roll(self, out_byte: u8, in_byte: u8) -> Self {
        let without_leading =
            self.state.wrapping_sub(u64::from(out_byte).wrapping_mul(LEADING_WEIGHT));
        let state = without_leading.wrapping_mul(BASE).wrapping_add(u64::from(in_byte));
        Self { state }
    }

    /// The 64-bit fingerprint for the current window.
    ///
    /// Two equal fingerprints never imply two equal segments; callers must
    /// verify by byte comparison.
    #[must_use]
    pub fn value(self) -> u64 {
        avalanche(self.state)
    }
}

/// splitmix64 finalizer: full avalanche, no dependence on `BASE`.
fn avalanche(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^= x >> 31;
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(seed: u8) -> Vec<u8> {
        (0..SEGMENT_LEN).map(|i| seed.wrapping_add(i as u8)).collect()
    }

    #[test]
    fn reset_rejects_wrong_length() {
        assert!(XCodecHash::reset(&[0u8; SEGMENT_LEN - 1]).is_err());
        assert!(XCodecHash::reset(&[0u8; SEGMENT_LEN + 1]).is_err());
    }

    #[test]
    fn roll_matches_reset_for_shifted_window() {
        let mut first = window(0);
        let second: Vec<u8> = first[1..].iter().copied().chain(std::iter::once(200u8)).collect();

        let h_first = XCodecHash::reset(&first).expect("valid window");
        let h_second_reset = XCodecHash::reset(&second).expect("valid window");

        let h_second_rolled = h_first.roll(first[0], 200u8);
        assert_eq!(h_second_reset.value(), h_second_rolled.value());

        first.rotate_left(1);
    }

    #[test]
    fn distinct_windows_rarely_collide() {
        let mut values = std::collections::HashSet::new();
        for seed in 0..=255u8 {
            let h = XCodecHash::reset(&window(seed)).expect("valid window");
            values.insert(h.value());
        }
        // With full avalanche, 256 distinct inputs should produce 256 distinct
        // fingerprints with overwhelming probability.
        assert_eq!(values.len(), 256);
    }

    #[test]
    fn avalanche_flips_many_bits() {
        let a = XCodecHash::reset(&window(0)).expect("valid window").value();
        let b = XCodecHash::reset(&window(1)).expect("valid window").value();
        assert!((a ^ b).count_ones() > 16, "expected broad avalanche between adjacent windows");
    }
}
