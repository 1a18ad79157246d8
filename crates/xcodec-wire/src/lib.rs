//! Wire framing for the XCodec pipe-pair protocol.
//!
//! Defines the six opcodes ([`Opcode`]) and their payload encodings
//! ([`Message`], [`decode`]) that carry encoded frames and out-of-band
//! teach/ask/end-of-stream control messages between two pipe-pair endpoints.
//! This crate has no notion of connection state; that lives in
//! `xcodec-pipe`, which sequences these messages.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod message;
mod opcode;

pub use error::ProtocolError;
pub use message::{DecodeOutcome, MAX_FRAME_LEN, Message, decode};
pub use opcode::Opcode;
