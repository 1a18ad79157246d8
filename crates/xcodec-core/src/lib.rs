//! Content-defined chunking, rolling hash, and segment cache for XCodec.
//!
//! This crate implements the leaf layers of the codec: the rolling
//! fingerprint ([`hash::XCodecHash`]), the segment type and cache
//! abstraction ([`segment`], [`cache`]), and the stateless encoder/decoder
//! ([`encoder`], [`decoder`]) that turn a plaintext stream into a token
//! stream of literals and segment references and back.
//!
//! Disk-backed caches (COSS) and the framing protocol that carries this
//! crate's token stream between peers live in sibling crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod hash;
pub mod segment;
mod varint;

pub use cache::{Cache, CacheUuid, MemoryCache, UUID_SIZE};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{CacheError, CodecError, ErrorKind};
pub use hash::XCodecHash;
pub use segment::{SEGMENT_LEN, Segment};
