//! Stateless-between-calls encoder: replaces recurring 64-byte segments with
//! 8-byte fingerprints.
//!
//! Grounded on the component description in `SPEC_FULL.md` §4.2; the
//! reference implementation's encoder source was not part of the retrieved
//! pack, so the token-stream layout below (the escape/reference markers and
//! the teach heuristic) is this crate's own extraction of the algorithm,
//! recorded in `DESIGN.md`.

use std::collections::VecDeque;

use bytes::BytesMut;

use crate::{cache::Cache, error::CodecError, hash::XCodecHash, segment::SEGMENT_LEN, varint};

/// Marks one escaped literal byte: `ESCAPE literal_byte`.
pub(crate) const ESCAPE_MARKER: u8 = 0x00;
/// Marks a reference token: `REFERENCE fingerprint[8] offset[varint]`.
pub(crate) const REFERENCE_MARKER: u8 = 0x01;

/// Low bits of the fingerprint that must be zero for a window to be taught.
///
/// A 5-bit filter gives content-defined chunk boundaries with an expected
/// spacing of 32 bytes between candidate boundaries, independent of any
/// fixed stream offset — insertions or deletions elsewhere in the stream
/// don't shift where later segments are recognised.
const TEACH_FILTER_BITS: u32 = 5;

fn is_teach_boundary(hash: u64) -> bool {
    hash.trailing_zeros() >= TEACH_FILTER_BITS || hash == 0
}

/// Encodes plaintext into a token stream of literals and segment references.
///
/// Holds no state across `encode` calls except the sliding window; flushing
/// trailing buffered bytes is explicit via [`Encoder::flush`].
#[derive(Debug, Default)]
pub struct Encoder {
    window: VecDeque<u8>,
    carry: Vec<u8>,
    hash: Option<XCodecHash>,
}

impl Encoder {
    /// Creates a fresh encoder with an empty window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains `input`, appending an encoded token stream to `output`.
    ///
    /// # Errors
    ///
    /// Propagates cache errors from teaching or looking up segments.
    pub fn encode(
        &mut self,
        cache: &mut dyn Cache,
        output: &mut BytesMut,
        input: &[u8],
    ) -> Result<(), CodecError> {
        for &byte in input {
            self.push_byte(cache, output, byte)?;
        }
        Ok(())
    }

    /// Emits any bytes buffered in the window or carry as literals, clearing
    /// all encoder state. Call on orderly local close (`EOS`).
    pub fn flush(&mut self, output: &mut BytesMut) {
        encode_literals(output, &self.carry);
        self.carry.clear();
        let tail: Vec<u8> = self.window.drain(..).collect();
        encode_literals(output, &tail);
        self.hash = None;
    }

    fn push_byte(
        &mut self,
        cache: &mut dyn Cache,
        output: &mut BytesMut,
        byte: u8,
    ) -> Result<(), CodecError> {
        if self.window.len() < SEGMENT_LEN {
            self.window.push_back(byte);
            if self.window.len() == SEGMENT_LEN {
                let contiguous = self.window.make_contiguous();
                let hash = XCodecHash::reset(contiguous)?;
                self.hash = Some(hash);
                self.evaluate_window(cache, output)?;
            }
            return Ok(());
        }

        // window.len() == SEGMENT_LEN here, so pop_front always succeeds.
        let Some(out_byte) = self.window.pop_front() else { return Ok(()) };
        self.carry.push(out_byte);
        self.window.push_back(byte);

        let hash = match self.hash {
            Some(h) => h.roll(out_byte, byte),
            None => {
                let contiguous = self.window.make_contiguous();
                XCodecHash::reset(contiguous)?
            },
        };
        self.hash = Some(hash);
        self.evaluate_window(cache, output)
    }

    fn evaluate_window(
        &mut self,
        cache: &mut dyn Cache,
        output: &mut BytesMut,
    ) -> Result<(), CodecError> {
        let Some(hash) = self.hash else { return Ok(()) };
        let fingerprint = hash.value();
        let contiguous = self.window.make_contiguous();

        if let Some(candidate) = cache.lookup(fingerprint)? {
            if candidate.as_bytes() == contiguous {
                encode_literals(output, &self.carry);
                self.carry.clear();
                encode_reference(output, fingerprint);
                self.window.clear();
                self.hash = None;
                return Ok(());
            }
            // Fingerprint collides with unrelated content already in the
            // cache; can't reference it safely. Fall through untaught.
            return Ok(());
        }

        if is_teach_boundary(fingerprint) {
            let segment = crate::segment::Segment::new(contiguous.to_vec())?;
            cache.enter(fingerprint, segment)?;
        }
        Ok(())
    }
}

fn encode_literals(output: &mut BytesMut, literals: &[u8]) {
    for &byte in literals {
        if byte == ESCAPE_MARKER || byte == REFERENCE_MARKER {
            output.extend_from_slice(&[ESCAPE_MARKER, byte]);
        } else {
            output.extend_from_slice(&[byte]);
        }
    }
}

fn encode_reference(output: &mut BytesMut, fingerprint: u64) {
    output.extend_from_slice(&[REFERENCE_MARKER]);
    output.extend_from_slice(&fingerprint.to_be_bytes());
    // This implementation only ever references whole, aligned segments, so
    // the offset is always zero; the field exists for wire compatibility
    // with a future partial-segment reference capability.
    varint::encode(output, 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheUuid, MemoryCache};

    #[test]
    fn short_input_is_all_literal_after_flush() {
        let mut cache = MemoryCache::new(CacheUuid::from_bytes([0; 16]));
        let mut encoder = Encoder::new();
        let mut out = BytesMut::new();
        encoder.encode(&mut cache, &mut out, b"hello").expect("encode succeeds");
        encoder.flush(&mut out);
        assert_eq!(out.as_ref(), b"hello");
    }

    #[test]
    fn known_segment_is_encoded_as_a_reference() {
        let pattern: Vec<u8> = (0..SEGMENT_LEN as u8).collect();
        let fingerprint = XCodecHash::reset(&pattern).expect("valid window").value();

        let mut cache = MemoryCache::new(CacheUuid::from_bytes([0; 16]));
        cache
            .enter(fingerprint, crate::segment::Segment::new(pattern.clone()).expect("valid len"))
            .expect("enter succeeds");

        let mut encoder = Encoder::new();
        let mut out = BytesMut::new();
        encoder.encode(&mut cache, &mut out, &pattern).expect("encode succeeds");
        encoder.flush(&mut out);

        let mut expected = BytesMut::new();
        encode_reference(&mut expected, fingerprint);
        assert_eq!(out.as_ref(), expected.as_ref());
    }
}
