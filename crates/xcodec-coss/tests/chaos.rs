//! Fault-injection coverage for `CacheIo` propagation through a real
//! disk-backed cache.

use tempfile::tempdir;
use xcodec_core::{Cache, CacheError, Segment};
use xcodec_coss::{ChaoticCache, CossCache};

fn segment(byte: u8) -> Segment {
    Segment::new(vec![byte; xcodec_core::SEGMENT_LEN]).expect("valid length")
}

#[test]
fn full_failure_rate_surfaces_cache_io_errors() {
    let dir = tempdir().expect("tempdir");
    let cache = CossCache::open(dir.path(), 1).expect("open cache");
    let mut chaotic = ChaoticCache::new(cache, 1.0);

    let err = chaotic.enter(1, segment(1)).expect_err("must fail at 100% rate");
    assert!(matches!(err, CacheError::Io { .. }));
}

#[test]
fn zero_failure_rate_passes_through_to_a_real_cache() {
    let dir = tempdir().expect("tempdir");
    let cache = CossCache::open(dir.path(), 1).expect("open cache");
    let mut chaotic = ChaoticCache::new(cache, 0.0);

    chaotic.enter(1, segment(1)).expect("must succeed at 0% rate");
    assert_eq!(chaotic.lookup(1).expect("lookup succeeds"), Some(segment(1)));
}
