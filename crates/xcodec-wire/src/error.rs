//! Errors from parsing and building wire messages.

use thiserror::Error;
use xcodec_core::ErrorKind;

/// Errors surfaced while decoding or encoding a [`crate::Message`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// The leading opcode byte did not match any recognised message.
    #[error("invalid opcode byte: {byte:#04x}")]
    InvalidOpcode {
        /// The unrecognised byte.
        byte: u8,
    },

    /// `HELLO`'s length prefix did not equal [`xcodec_core::UUID_SIZE`].
    #[error("invalid HELLO length: expected {expected}, got {actual}")]
    InvalidHelloLength {
        /// The expected length ([`xcodec_core::UUID_SIZE`]).
        expected: u8,
        /// The length actually found on the wire.
        actual: u8,
    },

    /// A `FRAME`'s length prefix was 0 or exceeded `MAX_FRAME_LEN`.
    #[error("invalid FRAME length: {len} (must be 1..={max})")]
    InvalidFrameLength {
        /// The length found on the wire.
        len: u16,
        /// The maximum allowed length ([`crate::message::MAX_FRAME_LEN`]).
        max: u16,
    },
}

impl ProtocolError {
    /// Every wire-level error is a protocol violation: malformed framing is
    /// always fatal to the pipe-pair.
    #[must_use]
    pub fn kind(self) -> ErrorKind {
        ErrorKind::ProtocolViolation
    }
}
