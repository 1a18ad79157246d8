//! Errors from driving a [`crate::PipePair`].

use thiserror::Error;
use xcodec_core::{CacheError, CodecError, ErrorKind};
use xcodec_wire::ProtocolError;

/// State-machine-level protocol violations: messages that are
/// structurally well-formed (the wire layer already validated that) but
/// arrive in a sequence the handshake/EOS discipline forbids.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceViolation {
    /// A second `HELLO` arrived on an already-established pipe-pair.
    #[error("received HELLO twice")]
    DuplicateHello,
    /// `ASK` arrived before this side had sent its own `HELLO`.
    #[error("received ASK before sending HELLO")]
    AskBeforeHello,
    /// `ASK` referenced a fingerprint this side's cache also lacks.
    #[error("unknown hash in ASK: {hash:#018x}")]
    UnknownAskHash {
        /// The fingerprint neither side could resolve.
        hash: u64,
    },
    /// `LEARN` arrived before the peer's `HELLO`.
    #[error("received LEARN before HELLO")]
    LearnBeforeHello,
    /// `FRAME` arrived before the peer's `HELLO`.
    #[error("received FRAME before HELLO")]
    FrameBeforeHello,
    /// A second `EOS` arrived on this pipe-pair.
    #[error("received duplicate EOS")]
    DuplicateEos,
    /// `EOS_ACK` arrived before this side had sent its own `EOS`.
    #[error("received EOS_ACK before sending EOS")]
    EosAckBeforeEos,
    /// A second `EOS_ACK` arrived on this pipe-pair.
    #[error("received duplicate EOS_ACK")]
    DuplicateEosAck,
    /// The application side tried to send data or close after local `EOS`.
    #[error("plaintext side used after local EOS")]
    PlaintextAfterLocalEos,
    /// The wire-facing transport hit EOF before the shutdown handshake
    /// completed, or with undecoded bytes still buffered.
    #[error("peer closed the wire transport before completing shutdown")]
    PeerClosedWireAbruptly,
}

/// Errors surfaced while driving a [`crate::PipePair`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipeError {
    /// A message arrived out of the sequence the handshake/EOS discipline
    /// permits.
    #[error(transparent)]
    Sequence(#[from] SequenceViolation),

    /// A message's bytes were malformed at the wire layer.
    #[error(transparent)]
    Wire(#[from] ProtocolError),

    /// The codec (encoder or decoder) reported an error.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The cache reported an error outside of a codec call (an `ASK`
    /// response lookup or a `LEARN` entry).
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl PipeError {
    /// Maps this error onto the coarse tag the driver dispatches recovery
    /// policy on.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sequence(_) | Self::Wire(_) => ErrorKind::ProtocolViolation,
            Self::Codec(err) => err.kind(),
            Self::Cache(err) => err.kind(),
        }
    }
}
