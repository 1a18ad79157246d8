//! Pipe-pair endpoint state machine for the XCodec framing protocol.
//!
//! A [`PipePair`] sits between a plaintext application stream and an
//! encoded wire stream, driving `xcodec-core`'s encoder/decoder against
//! `xcodec-wire`'s message framing. It is a pure state machine: every
//! method takes bytes or plaintext and returns the [`PipeAction`]s the
//! caller must carry out, with no socket or file I/O of its own.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod pipe;
mod registry;

pub use error::{PipeError, SequenceViolation};
pub use pipe::{PipeAction, PipePair};
pub use registry::CacheRegistry;
