//! Message encoding and decoding for the pipe-pair wire protocol.
//!
//! Grounded on the reference implementation's `xcodec_pipe_pair.cc`
//! `decoder_consume`, which peeks the opcode byte and waits for the rest of
//! the payload to arrive before consuming it — the same "not enough bytes
//! yet, try again later" shape [`decode`] follows here.

use bytes::{Bytes, BytesMut};
use xcodec_core::{CacheUuid, Segment, UUID_SIZE};

use crate::{error::ProtocolError, opcode::Opcode};

/// Maximum `FRAME` payload length, per the wire format.
pub const MAX_FRAME_LEN: u16 = 32768;

/// One parsed pipe-pair message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Advertises the sender's cache UUID. Must be the first message sent.
    Hello(CacheUuid),
    /// Teaches the peer one segment.
    Learn(Segment),
    /// Requests the segment for a fingerprint.
    Ask(u64),
    /// "I have no more data."
    Eos,
    /// "I have processed all your data; you may close."
    EosAck,
    /// A chunk of encoder output, `1..=MAX_FRAME_LEN` bytes.
    Frame(Bytes),
}

impl Message {
    /// This message's opcode.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Hello(_) => Opcode::Hello,
            Self::Learn(_) => Opcode::Learn,
            Self::Ask(_) => Opcode::Ask,
            Self::Eos => Opcode::Eos,
            Self::EosAck => Opcode::EosAck,
            Self::Frame(_) => Opcode::Frame,
        }
    }

    /// Appends this message's wire encoding to `output`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidFrameLength`] if a `Frame` payload is
    /// empty or exceeds [`MAX_FRAME_LEN`].
    pub fn encode(&self, output: &mut BytesMut) -> Result<(), ProtocolError> {
        output.extend_from_slice(&[self.opcode().to_byte()]);
        match self {
            Self::Hello(uuid) => {
                #[allow(clippy::cast_possible_truncation, reason = "UUID_SIZE fits in a u8")]
                output.extend_from_slice(&[UUID_SIZE as u8]);
                output.extend_from_slice(uuid.as_bytes());
            },
            Self::Learn(segment) => {
                output.extend_from_slice(segment.as_bytes());
            },
            Self::Ask(hash) => {
                output.extend_from_slice(&hash.to_be_bytes());
            },
            Self::Eos | Self::EosAck => {},
            Self::Frame(data) => {
                let len = u16::try_from(data.len())
                    .map_err(|_| ProtocolError::InvalidFrameLength { len: u16::MAX, max: MAX_FRAME_LEN })?;
                if len == 0 || len > MAX_FRAME_LEN {
                    return Err(ProtocolError::InvalidFrameLength { len, max: MAX_FRAME_LEN });
                }
                output.extend_from_slice(&len.to_be_bytes());
                output.extend_from_slice(data);
            },
        }
        Ok(())
    }
}

/// Result of attempting to decode one message from the front of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A complete message was parsed; `consumed` bytes should be dropped from
    /// the front of the input buffer.
    Message {
        /// The parsed message.
        message: Message,
        /// Number of bytes consumed from the input.
        consumed: usize,
    },
    /// Not enough bytes are buffered yet; call again once more arrive.
    Incomplete,
}

/// Attempts to decode one message from the start of `buf`.
///
/// Does not mutate `buf`; the caller drops `consumed` bytes once satisfied
/// the message has been handled (mirroring the reference implementation's
/// pattern of peeking the opcode and payload before consuming).
///
/// # Errors
///
/// Returns a [`ProtocolError`] for an unrecognised opcode or a structurally
/// invalid payload (wrong `HELLO` length, out-of-range `FRAME` length). Never
/// errors merely because `buf` is short; that case is represented by
/// [`DecodeOutcome::Incomplete`].
pub fn decode(buf: &[u8]) -> Result<DecodeOutcome, ProtocolError> {
    let Some(&opcode_byte) = buf.first() else {
        return Ok(DecodeOutcome::Incomplete);
    };
    let opcode = Opcode::from_byte(opcode_byte)?;

    match opcode {
        Opcode::Hello => {
            let Some(&len) = buf.get(1) else { return Ok(DecodeOutcome::Incomplete) };
            #[allow(clippy::cast_possible_truncation, reason = "UUID_SIZE fits in a u8")]
            let expected = UUID_SIZE as u8;
            if len != expected {
                return Err(ProtocolError::InvalidHelloLength { expected, actual: len });
            }
            let Some(uuid_bytes) = buf.get(2..2 + UUID_SIZE) else {
                return Ok(DecodeOutcome::Incomplete);
            };
            let mut array = [0u8; UUID_SIZE];
            array.copy_from_slice(uuid_bytes);
            Ok(DecodeOutcome::Message {
                message: Message::Hello(CacheUuid::from_bytes(array)),
                consumed: 2 + UUID_SIZE,
            })
        },
        Opcode::Learn => {
            let segment_len = xcodec_core::SEGMENT_LEN;
            let Some(segment_bytes) = buf.get(1..1 + segment_len) else {
                return Ok(DecodeOutcome::Incomplete);
            };
            let segment = match Segment::new(Bytes::copy_from_slice(segment_bytes)) {
                Ok(segment) => segment,
                Err(_) => unreachable!("slice above is exactly SEGMENT_LEN bytes"),
            };
            Ok(DecodeOutcome::Message { message: Message::Learn(segment), consumed: 1 + segment_len })
        },
        Opcode::Ask => {
            let Some(hash_bytes) = buf.get(1..9) else { return Ok(DecodeOutcome::Incomplete) };
            let mut array = [0u8; 8];
            array.copy_from_slice(hash_bytes);
            Ok(DecodeOutcome::Message { message: Message::Ask(u64::from_be_bytes(array)), consumed: 9 })
        },
        Opcode::Eos => Ok(DecodeOutcome::Message { message: Message::Eos, consumed: 1 }),
        Opcode::EosAck => Ok(DecodeOutcome::Message { message: Message::EosAck, consumed: 1 }),
        Opcode::Frame => {
            let Some(len_bytes) = buf.get(1..3) else { return Ok(DecodeOutcome::Incomplete) };
            let mut array = [0u8; 2];
            array.copy_from_slice(len_bytes);
            let len = u16::from_be_bytes(array);
            if len == 0 || len > MAX_FRAME_LEN {
                return Err(ProtocolError::InvalidFrameLength { len, max: MAX_FRAME_LEN });
            }
            let len_usize = usize::from(len);
            let Some(payload) = buf.get(3..3 + len_usize) else {
                return Ok(DecodeOutcome::Incomplete);
            };
            Ok(DecodeOutcome::Message {
                message: Message::Frame(Bytes::copy_from_slice(payload)),
                consumed: 3 + len_usize,
            })
        },
    }
}
