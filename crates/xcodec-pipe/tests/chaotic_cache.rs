//! A cache that fails on every call must surface its errors as
//! `PipeError::Cache`, tagged `ErrorKind::CacheIo`, not panic or silently
//! swallow the failure.

use xcodec_core::{CacheUuid, ErrorKind, MemoryCache};
use xcodec_coss::ChaoticCache;
use xcodec_pipe::PipePair;

#[test]
fn a_failing_cache_surfaces_as_cache_io_on_encode() {
    let uuid = CacheUuid::from_bytes([11; xcodec_core::UUID_SIZE]);
    let cache = ChaoticCache::new(MemoryCache::new(uuid), 1.0);
    let mut pipe = PipePair::new(uuid, cache);

    let input: Vec<u8> = (0..xcodec_core::SEGMENT_LEN as u8 * 4).collect();
    let error = pipe.encode_plaintext(&input).expect_err("every cache call fails");

    assert_eq!(error.kind(), ErrorKind::CacheIo);
}

#[test]
fn a_failing_cache_surfaces_as_cache_io_on_learn() {
    let local_uuid = CacheUuid::from_bytes([12; xcodec_core::UUID_SIZE]);
    let peer_uuid = CacheUuid::from_bytes([13; xcodec_core::UUID_SIZE]);
    let cache = ChaoticCache::new(MemoryCache::new(local_uuid), 1.0);
    let mut pipe = PipePair::new(local_uuid, cache);

    let mut hello = bytes::BytesMut::new();
    xcodec_wire::Message::Hello(peer_uuid).encode(&mut hello).expect("encodes");
    pipe.receive_wire_bytes(&hello).expect("HELLO never touches the cache");

    let pattern: Vec<u8> = (0..xcodec_core::SEGMENT_LEN as u8).collect();
    let segment = xcodec_core::Segment::new(pattern).expect("valid length");
    let mut learn = bytes::BytesMut::new();
    xcodec_wire::Message::Learn(segment).encode(&mut learn).expect("encodes");

    let error = pipe.receive_wire_bytes(&learn).expect_err("cache lookup fails");
    assert_eq!(error.kind(), ErrorKind::CacheIo);
}
