//! Decoder: resolves fingerprints against a shared cache, surfacing misses.
//!
//! Grounded on the component description in `SPEC_FULL.md` §4.3 and the
//! token-stream layout this crate defines in `encoder.rs`.

use std::collections::HashSet;

use bytes::BytesMut;

use crate::{
    cache::Cache,
    encoder::{ESCAPE_MARKER, REFERENCE_MARKER},
    error::CodecError,
    varint,
};

/// Resolves an encoded token stream back into plaintext.
///
/// While [`Decoder::unknown_hashes`] is non-empty, `decode` buffers incoming
/// bytes but produces no further plaintext output at all (not just pausing
/// at the unresolved reference) until the protocol layer resolves every
/// pending fingerprint via [`Decoder::resolve`].
#[derive(Debug, Default)]
pub struct Decoder {
    buffer: Vec<u8>,
    unknown_hashes: HashSet<u64>,
}

impl Decoder {
    /// Creates a fresh decoder with no buffered input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprints referenced but not yet resolvable against the cache.
    #[must_use]
    pub fn unknown_hashes(&self) -> &HashSet<u64> {
        &self.unknown_hashes
    }

    /// Marks a fingerprint as resolved, typically after the protocol layer
    /// has entered it into the cache in response to an `ASK`/`LEARN`
    /// exchange. Decoding does not resume until this set is empty.
    pub fn resolve(&mut self, hash: u64) {
        self.unknown_hashes.remove(&hash);
    }

    /// Whether every byte handed to [`Decoder::decode`] so far has been
    /// turned into plaintext output, with no unresolved references pending.
    ///
    /// The protocol layer uses this to decide when it may send `EOS_ACK`:
    /// only once the peer's `EOS` has arrived and the decoder is idle.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.buffer.is_empty() && self.unknown_hashes.is_empty()
    }

    /// Appends `input` to the pending buffer and decodes as much as possible
    /// into `output`.
    ///
    /// Idempotent restart: calling again (with empty `input` is fine) after
    /// [`Decoder::unknown_hashes`] empties resumes exactly where decoding
    /// left off.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedOffset`] if a reference carries a
    /// non-zero offset, or propagates cache errors.
    pub fn decode(
        &mut self,
        cache: &mut dyn Cache,
        output: &mut BytesMut,
        input: &[u8],
    ) -> Result<(), CodecError> {
        self.buffer.extend_from_slice(input);

        if !self.unknown_hashes.is_empty() {
            return Ok(());
        }

        let mut pos = 0;
        while pos < self.buffer.len() {
            match self.buffer[pos] {
                ESCAPE_MARKER => {
                    let Some(&literal) = self.buffer.get(pos + 1) else { break };
                    output.extend_from_slice(&[literal]);
                    pos += 2;
                },
                REFERENCE_MARKER => {
                    let Some(hash_bytes) = self.buffer.get(pos + 1..pos + 9) else { break };
                    let mut hash_array = [0u8; 8];
                    hash_array.copy_from_slice(hash_bytes);
                    let hash = u64::from_be_bytes(hash_array);

                    let Some((offset, varint_len)) = varint::decode(&self.buffer[pos + 9..])
                    else {
                        break;
                    };
                    if offset != 0 {
                        return Err(CodecError::UnsupportedOffset { offset });
                    }

                    match cache.lookup(hash)? {
                        Some(segment) => {
                            output.extend_from_slice(segment.as_bytes());
                            pos += 1 + 8 + varint_len;
                        },
                        None => {
                            self.unknown_hashes.insert(hash);
                            self.buffer.drain(..pos);
                            return Ok(());
                        },
                    }
                },
                literal => {
                    output.extend_from_slice(&[literal]);
                    pos += 1;
                },
            }
        }
        self.buffer.drain(..pos);
        Ok(())
    }
}
