//! The fixed-size content unit shared by the codec and cache layers.

use bytes::Bytes;

use crate::error::CodecError;

/// Length in bytes of one segment: the unit of caching and reference.
pub const SEGMENT_LEN: usize = 64;

/// A 64-byte content unit, cheaply cloned and shared between the codec,
/// cache, and wire layers.
///
/// # Invariants
///
/// A `Segment` always holds exactly [`SEGMENT_LEN`] bytes; [`Segment::new`] is
/// the only constructor and enforces this.
#[derive(Clone, PartialEq, Eq)]
pub struct Segment(Bytes);

impl Segment {
    /// Builds a segment from exactly [`SEGMENT_LEN`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidSegmentLength`] if `bytes` is not exactly
    /// [`SEGMENT_LEN`] bytes long.
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self, CodecError> {
        let bytes = bytes.into();
        if bytes.len() != SEGMENT_LEN {
            return Err(CodecError::InvalidSegmentLength { actual: bytes.len() });
        }
        Ok(Self(bytes))
    }

    /// Borrows the underlying bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Segment").field(&format_args!("{} bytes", self.0.len())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert!(Segment::new(vec![0u8; 63]).is_err());
        assert!(Segment::new(vec![0u8; 65]).is_err());
    }

    #[test]
    fn round_trips_bytes() {
        let payload = vec![7u8; SEGMENT_LEN];
        let segment = Segment::new(payload.clone()).expect("valid length");
        assert_eq!(segment.as_bytes(), payload.as_slice());
    }
}
