//! Fuzz target for `xcodec_wire::decode`.
//!
//! Tests message decoding with arbitrary byte sequences to find parser
//! crashes, integer overflows in length fields, and buffer over-reads.
//!
//! The decoder should NEVER panic. Malformed or truncated input must return
//! an error or `Incomplete`, never more.

#![no_main]

use libfuzzer_sys::fuzz_target;
use xcodec_wire::decode;

fuzz_target!(|data: &[u8]| {
    let _ = decode(data);
});
