//! Fuzz target for `xcodec_coss::validate_stripe_bytes`.
//!
//! A COSS stripe is read straight off disk on every restart, so its parser
//! has to survive whatever garbage a crash mid-write, a truncated file, or a
//! disk corruption leaves behind. This feeds it arbitrary bytes at both the
//! exact expected stripe length and a handful of other lengths, and checks
//! it only ever returns `None` or a serial, never panics.

#![no_main]

use libfuzzer_sys::fuzz_target;
use xcodec_coss::{layout::stripe_total_len, validate_stripe_bytes};

fuzz_target!(|data: &[u8]| {
    // Exercise the checksum path too, not just the length guard: most random
    // inputs are far shorter than a real stripe, so also try the fuzzer's
    // bytes tiled out to exactly one stripe's length.
    let _ = validate_stripe_bytes(data);

    if data.is_empty() {
        return;
    }
    let expected_len = usize::try_from(stripe_total_len()).unwrap_or(0);
    let tiled: Vec<u8> = data.iter().copied().cycle().take(expected_len).collect();
    let _ = validate_stripe_bytes(&tiled);
});
