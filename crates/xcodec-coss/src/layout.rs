//! On-disk layout constants for a COSS file.
//!
//! A stripe is `METADATA_BYTES` (header) ‖ `hash_array` ‖ `size_array` ‖
//! `segment_array`, in that order. Sizes come from the original
//! implementation's `#define METADATA_BYTES 4096` / `#define ARRAY_SIZE 2048`.

/// Size in bytes reserved for a stripe's metadata region (serial, checksum,
/// and padding). Page-aligned, per the original implementation's comment.
pub const METADATA_BYTES: usize = 4096;

/// Number of fingerprint/size/segment slots per stripe.
pub const ARRAY_SIZE: usize = 2048;

/// Bytes occupied by a stripe's header: metadata ‖ hash array ‖ size array.
#[must_use]
pub fn stripe_header_len() -> u64 {
    #[allow(clippy::cast_possible_truncation, reason = "layout constants are small")]
    let len = METADATA_BYTES + ARRAY_SIZE * 8 + ARRAY_SIZE * 4;
    len as u64
}

/// Total bytes occupied by one stripe, header and segment array included.
#[must_use]
pub fn stripe_total_len() -> u64 {
    #[allow(clippy::cast_possible_truncation, reason = "layout constants are small")]
    let segment_bytes = ARRAY_SIZE * xcodec_core::SEGMENT_LEN;
    stripe_header_len() + segment_bytes as u64
}

/// Rounds `value` up to the nearest multiple of `multiple`.
#[must_use]
pub fn round_up(value: u64, multiple: u64) -> u64 {
    value.div_ceil(multiple) * multiple
}
