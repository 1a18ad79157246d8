//! Errors from the disk-backed COSS cache.

use thiserror::Error;
use xcodec_core::ErrorKind;

/// Errors surfaced while reading or writing a COSS cache file.
#[derive(Error, Debug)]
pub enum CossError {
    /// The underlying file could not be read or written.
    #[error("coss file io error: {0}")]
    Io(#[from] std::io::Error),

    /// A `LEARN`-equivalent `enter` conflicted with an already-stored
    /// segment for the same fingerprint.
    #[error("segment collision for fingerprint {hash:#018x}")]
    Collision {
        /// The fingerprint whose stored bytes disagree with the new ones.
        hash: u64,
    },

    /// A segment read back off disk failed the codec layer's own
    /// invariants (wrong length).
    #[error("segment rejected by codec layer: {0}")]
    Codec(#[from] xcodec_core::CodecError),
}

impl CossError {
    /// Which of the five error tags this failure maps to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::CacheIo,
            Self::Collision { .. } => ErrorKind::Collision,
            Self::Codec(inner) => inner.kind(),
        }
    }
}
