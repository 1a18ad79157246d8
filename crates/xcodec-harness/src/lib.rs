//! Deterministic simulation harness for the XCodec proxy.
//!
//! Turmoil-based network simulation tests drive
//! [`xcodec_proxy::run_session`] directly over turmoil's virtual TCP stack.
//! The [`corpus`] module provides seeded, redundancy-laden plaintext for
//! exercising the `ASK`/`LEARN` path deterministically.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod corpus;
