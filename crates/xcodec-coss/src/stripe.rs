//! A single stripe: its on-disk header plus its in-memory segment buffer.
//!
//! Grounded on the original implementation's `COSSStripeHeader` /
//! `COSSStripe`: `append` writes a segment into the next free slot and
//! records its fingerprint and length in the parallel arrays; `reset` wipes a
//! stripe back to `EMPTY` and assigns it a fresh serial; `seal` computes the
//! checksum this implementation adds (see `SPEC_FULL.md` §4.4) and returns
//! the bytes to write to disk.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{checksum::fnv1a, layout::ARRAY_SIZE, layout::METADATA_BYTES};

#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
struct StripeHeaderBytes {
    serial: [u8; 8],
    checksum: [u8; 8],
    reserved: [u8; METADATA_BYTES - 16],
    hash_array: [u8; ARRAY_SIZE * 8],
    size_array: [u8; ARRAY_SIZE * 4],
}

impl StripeHeaderBytes {
    const SIZE: usize = METADATA_BYTES + ARRAY_SIZE * 8 + ARRAY_SIZE * 4;

    fn zeroed() -> Self {
        Self {
            serial: [0; 8],
            checksum: [0; 8],
            reserved: [0; METADATA_BYTES - 16],
            hash_array: [0; ARRAY_SIZE * 8],
            size_array: [0; ARRAY_SIZE * 4],
        }
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (header, _rest) = Self::ref_from_prefix(bytes).ok()?;
        Some(*header)
    }

    fn serial(&self) -> u64 {
        u64::from_be_bytes(self.serial)
    }

    fn set_serial(&mut self, value: u64) {
        self.serial = value.to_be_bytes();
    }

    fn checksum(&self) -> u64 {
        u64::from_be_bytes(self.checksum)
    }

    fn set_checksum(&mut self, value: u64) {
        self.checksum = value.to_be_bytes();
    }

    fn hash_at(&self, index: usize) -> u64 {
        let start = index * 8;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.hash_array[start..start + 8]);
        u64::from_be_bytes(buf)
    }

    fn set_hash_at(&mut self, index: usize, value: u64) {
        let start = index * 8;
        self.hash_array[start..start + 8].copy_from_slice(&value.to_be_bytes());
    }

    fn size_at(&self, index: usize) -> u32 {
        let start = index * 4;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.size_array[start..start + 4]);
        u32::from_be_bytes(buf)
    }

    fn set_size_at(&mut self, index: usize, value: u32) {
        let start = index * 4;
        self.size_array[start..start + 4].copy_from_slice(&value.to_be_bytes());
    }
}

/// One stripe, held in memory while active or reconstructed from disk during
/// recovery.
pub(crate) struct Stripe {
    header: StripeHeaderBytes,
    segments: Vec<u8>,
    number: u64,
    current_pos: usize,
}

impl Stripe {
    pub(crate) fn empty(number: u64) -> Self {
        Self {
            header: StripeHeaderBytes::zeroed(),
            segments: vec![0u8; ARRAY_SIZE * xcodec_core::SEGMENT_LEN],
            number,
            current_pos: 0,
        }
    }

    /// Rebuilds a stripe from bytes read off disk (header then segment
    /// array), resuming appends after the last occupied slot.
    pub(crate) fn from_disk(number: u64, bytes: &[u8]) -> Self {
        let header = StripeHeaderBytes::from_bytes(&bytes[..StripeHeaderBytes::SIZE])
            .unwrap_or_else(|| unreachable!("buffer is exactly the stripe header length"));
        let segments = bytes[StripeHeaderBytes::SIZE..].to_vec();

        let mut current_pos = 0;
        while current_pos < ARRAY_SIZE && header.hash_at(current_pos) != 0 {
            current_pos += 1;
        }

        Self { header, segments, number, current_pos }
    }

    /// Wipes this stripe back to `EMPTY` and activates it under a new
    /// serial.
    pub(crate) fn reset(&mut self, serial: u64, number: u64) {
        self.header = StripeHeaderBytes::zeroed();
        self.header.set_serial(serial);
        self.segments.iter_mut().for_each(|byte| *byte = 0);
        self.number = number;
        self.current_pos = 0;
    }

    pub(crate) fn full(&self) -> bool {
        self.current_pos >= ARRAY_SIZE
    }

    pub(crate) fn number(&self) -> u64 {
        self.number
    }

    pub(crate) fn occupied(&self) -> usize {
        self.current_pos
    }

    /// Appends a segment to the next free slot. Panics if the stripe is
    /// already full; callers must seal and advance first.
    pub(crate) fn append(&mut self, hash: u64, segment: &[u8]) -> usize {
        debug_assert!(!self.full(), "append into a full stripe");
        debug_assert_eq!(segment.len(), xcodec_core::SEGMENT_LEN);

        let pos = self.current_pos;
        self.header.set_hash_at(pos, hash);
        #[allow(clippy::cast_possible_truncation, reason = "SEGMENT_LEN fits in a u32")]
        self.header.set_size_at(pos, segment.len() as u32);

        let start = pos * xcodec_core::SEGMENT_LEN;
        self.segments[start..start + segment.len()].copy_from_slice(segment);
        self.current_pos += 1;
        pos
    }

    pub(crate) fn hash_at(&self, pos: usize) -> u64 {
        self.header.hash_at(pos)
    }

    pub(crate) fn segment_at(&self, pos: usize, length: u32) -> &[u8] {
        let start = pos * xcodec_core::SEGMENT_LEN;
        &self.segments[start..start + length as usize]
    }

    /// Computes and stores this stripe's checksum, then returns the bytes to
    /// write to disk (header ‖ segment array).
    pub(crate) fn seal(&mut self) -> Vec<u8> {
        let checksum = fnv1a(&[&self.header.hash_array, &self.header.size_array, &self.segments]);
        self.header.set_checksum(checksum);

        let mut bytes = Vec::with_capacity(StripeHeaderBytes::SIZE + self.segments.len());
        bytes.extend_from_slice(self.header.as_bytes());
        bytes.extend_from_slice(&self.segments);
        bytes
    }
}

/// Reads a stripe header and validates its checksum against the segment
/// bytes that follow it in `stripe_bytes`. Returns `None` if the header's
/// `serial` and `checksum` are both zero (an untouched, never-sealed slot) or
/// if the stored checksum does not match the recomputed one (a torn write).
pub(crate) fn read_valid_header(stripe_bytes: &[u8]) -> Option<(u64, StripeHeaderSummary)> {
    let header = StripeHeaderBytes::from_bytes(&stripe_bytes[..StripeHeaderBytes::SIZE])
        .unwrap_or_else(|| unreachable!("buffer is exactly the stripe header length"));

    if header.serial() == 0 && header.checksum() == 0 {
        return None;
    }

    let segment_bytes = &stripe_bytes[StripeHeaderBytes::SIZE..];
    let recomputed = fnv1a(&[&header.hash_array, &header.size_array, segment_bytes]);
    if recomputed != header.checksum() {
        return None;
    }

    Some((header.serial(), StripeHeaderSummary { header }))
}

/// Validates a candidate on-disk stripe, checking its length and checksum
/// without constructing a [`CossCache`](crate::CossCache) around it.
///
/// Returns the stripe's serial on success. `stripe_bytes` of any length other
/// than [`crate::layout::stripe_total_len`] is rejected outright rather than
/// panicking, since untrusted or truncated disk content is exactly what this
/// guards against.
#[must_use]
pub fn validate_stripe_bytes(stripe_bytes: &[u8]) -> Option<u64> {
    let expected_len = usize::try_from(crate::layout::stripe_total_len()).ok()?;
    if stripe_bytes.len() != expected_len {
        return None;
    }
    read_valid_header(stripe_bytes).map(|(serial, _)| serial)
}

/// Just enough of a validated header to rebuild the in-memory `Stripe` for
/// the chosen active stripe.
pub(crate) struct StripeHeaderSummary {
    header: StripeHeaderBytes,
}

impl StripeHeaderSummary {
    pub(crate) fn occupied_count(&self) -> usize {
        let mut count = 0;
        while count < ARRAY_SIZE && self.header.hash_at(count) != 0 {
            count += 1;
        }
        count
    }

    pub(crate) fn hash_at(&self, pos: usize) -> u64 {
        self.header.hash_at(pos)
    }

    pub(crate) fn size_at(&self, pos: usize) -> u32 {
        self.header.size_at(pos)
    }
}

pub(crate) const STRIPE_HEADER_SIZE: usize = StripeHeaderBytes::SIZE;

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(byte: u8) -> Vec<u8> {
        vec![byte; xcodec_core::SEGMENT_LEN]
    }

    #[test]
    fn append_then_segment_at_round_trips() {
        let mut stripe = Stripe::empty(0);
        let pos = stripe.append(42, &segment(7));
        assert_eq!(stripe.hash_at(pos), 42);
        assert_eq!(stripe.segment_at(pos, xcodec_core::SEGMENT_LEN as u32), segment(7).as_slice());
    }

    #[test]
    fn full_after_array_size_appends() {
        let mut stripe = Stripe::empty(0);
        for i in 0..ARRAY_SIZE {
            #[allow(clippy::cast_possible_truncation, reason = "test loop bound is ARRAY_SIZE")]
            stripe.append(i as u64 + 1, &segment(1));
        }
        assert!(stripe.full());
    }

    #[test]
    fn reset_clears_slots_and_bumps_serial() {
        let mut stripe = Stripe::empty(0);
        stripe.append(1, &segment(1));
        stripe.reset(5, 1);
        assert_eq!(stripe.number(), 1);
        assert_eq!(stripe.occupied(), 0);
        assert_eq!(stripe.hash_at(0), 0);
    }

    #[test]
    fn sealed_bytes_round_trip_through_read_valid_header() {
        let mut stripe = Stripe::empty(3);
        stripe.reset(9, 3);
        stripe.append(42, &segment(7));
        let bytes = stripe.seal();

        let (serial, summary) = read_valid_header(&bytes).expect("checksum validates");
        assert_eq!(serial, 9);
        assert_eq!(summary.occupied_count(), 1);
        assert_eq!(summary.hash_at(0), 42);
        assert_eq!(summary.size_at(0), xcodec_core::SEGMENT_LEN as u32);
    }

    #[test]
    fn untouched_zero_stripe_is_not_a_valid_header() {
        let bytes = vec![0u8; STRIPE_HEADER_SIZE + ARRAY_SIZE * xcodec_core::SEGMENT_LEN];
        assert!(read_valid_header(&bytes).is_none());
    }

    #[test]
    fn corrupted_segment_bytes_fail_checksum_validation() {
        let mut stripe = Stripe::empty(0);
        stripe.reset(1, 0);
        stripe.append(1, &segment(1));
        let mut bytes = stripe.seal();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(read_valid_header(&bytes).is_none());
    }

    #[test]
    fn validate_stripe_bytes_accepts_a_sealed_stripe() {
        let mut stripe = Stripe::empty(0);
        stripe.reset(9, 0);
        stripe.append(1, &segment(1));
        let bytes = stripe.seal();
        assert_eq!(validate_stripe_bytes(&bytes), Some(9));
    }

    #[test]
    fn validate_stripe_bytes_rejects_the_wrong_length() {
        assert_eq!(validate_stripe_bytes(&[]), None);
        assert_eq!(validate_stripe_bytes(&[0u8; 17]), None);
    }
}
