//! Error types for the codec and in-memory cache layers.

use thiserror::Error;

/// Coarse error tags shared across every layer of the crate family.
///
/// The pipe-pair dispatches recovery policy on this tag rather than matching
/// every concrete error variant (see each layer's `kind()` method).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed message, unexpected opcode, or other wire-level violation.
    ProtocolViolation,
    /// A learned segment conflicts with one already held for the same
    /// fingerprint.
    Collision,
    /// Cache storage I/O failure.
    CacheIo,
    /// Underlying transport I/O failure.
    Io,
    /// Orderly local shutdown.
    LocalClose,
}

/// Errors from the encoder and decoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A window passed to [`crate::hash::XCodecHash::reset`] was not exactly
    /// [`crate::segment::SEGMENT_LEN`] bytes.
    #[error("invalid rolling-hash window length: {actual}")]
    InvalidWindowLength {
        /// The length that was supplied.
        actual: usize,
    },

    /// A buffer passed to [`crate::segment::Segment::new`] was not exactly
    /// [`crate::segment::SEGMENT_LEN`] bytes.
    #[error("invalid segment length: {actual}")]
    InvalidSegmentLength {
        /// The length that was supplied.
        actual: usize,
    },

    /// The token stream contained a `REFERENCE` with a non-zero segment
    /// offset. This implementation only ever emits whole-segment references,
    /// so a non-zero offset indicates either a malformed stream or a peer
    /// using a capability this codec does not implement.
    #[error("unsupported non-zero reference offset: {offset}")]
    UnsupportedOffset {
        /// The offset value found on the wire.
        offset: u64,
    },

    /// The token stream ended with a truncated `ESCAPE` or `REFERENCE` token.
    #[error("truncated token in encoded stream")]
    TruncatedToken,

    /// Underlying cache operation failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl CodecError {
    /// Maps this error onto the coarse tag the pipe-pair dispatches on.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidWindowLength { .. }
            | Self::InvalidSegmentLength { .. }
            | Self::UnsupportedOffset { .. }
            | Self::TruncatedToken => ErrorKind::ProtocolViolation,
            Self::Cache(cache_error) => cache_error.kind(),
        }
    }
}

/// Errors from a [`crate::cache::Cache`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// `enter` was called for a fingerprint that already maps to a different
    /// segment.
    #[error("fingerprint {hash:#018x} collides with an existing, different segment")]
    Collision {
        /// The fingerprint that collided.
        hash: u64,
    },

    /// The backing store failed to read or write.
    #[error("cache storage I/O failure: {message}")]
    Io {
        /// Description of the underlying failure.
        message: String,
    },
}

impl CacheError {
    /// Maps this error onto the coarse tag the pipe-pair dispatches on.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Collision { .. } => ErrorKind::Collision,
            Self::Io { .. } => ErrorKind::CacheIo,
        }
    }
}
