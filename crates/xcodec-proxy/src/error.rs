//! Error types for the proxy binary.

use thiserror::Error;
use xcodec_core::ErrorKind;
use xcodec_coss::CossError;
use xcodec_pipe::PipeError;

/// Errors that can occur while configuring or running the proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// A CLI argument or derived setting was invalid (e.g. an unparsable
    /// socket address).
    #[error("configuration error: {0}")]
    Config(String),

    /// A TCP socket operation failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The pipe-pair state machine reported a protocol, codec, or cache
    /// error.
    #[error(transparent)]
    Pipe(#[from] PipeError),

    /// The on-disk cache reported an error outside of a pipe-pair call
    /// (opening the cache file for a new connection).
    #[error(transparent)]
    Coss(#[from] CossError),
}

impl ProxyError {
    /// Maps this error onto the coarse tag the rest of the crate family
    /// dispatches recovery policy on.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::ProtocolViolation,
            Self::Io(_) => ErrorKind::Io,
            Self::Pipe(err) => err.kind(),
            Self::Coss(err) => err.kind(),
        }
    }
}
