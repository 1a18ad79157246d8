//! Disk-backed cyclic object storage cache (COSS) for XCodec segments.
//!
//! One file per cache UUID, divided into fixed-size stripes; one stripe is
//! active in memory at a time, the rest live on disk with their
//! fingerprint/size arrays indexed in memory. Implements
//! [`xcodec_core::Cache`], so it's a drop-in replacement for
//! [`xcodec_core::MemoryCache`] wherever persistence across restarts matters.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chaotic;
mod checksum;
mod coss;
mod error;
mod index;
pub mod layout;
mod stripe;

pub use chaotic::ChaoticCache;
pub use coss::CossCache;
pub use error::CossError;
pub use stripe::validate_stripe_bytes;
