//! Property test: a redundancy-laden corpus, of whatever seed and size,
//! survives a full encode/decode round trip through two in-process
//! pipe-pairs byte for byte.
//!
//! Complements the fixed-input round-trip test already in `xcodec-pipe`
//! itself by sweeping many corpus shapes, which is the only way to be
//! confident the content-defined chunking boundaries line up correctly
//! across arbitrary redundancy patterns rather than just the one input that
//! crate's own unit test happens to use.

use bytes::{Bytes, BytesMut};
use proptest::prelude::*;
use xcodec_core::{CacheUuid, MemoryCache, UUID_SIZE};
use xcodec_harness::corpus::redundant_corpus;
use xcodec_pipe::{PipeAction, PipePair};

fn new_pair() -> (PipePair<MemoryCache>, PipePair<MemoryCache>) {
    let a = PipePair::new(
        CacheUuid::from_bytes([5; UUID_SIZE]),
        MemoryCache::new(CacheUuid::from_bytes([5; UUID_SIZE])),
    );
    let b = PipePair::new(
        CacheUuid::from_bytes([6; UUID_SIZE]),
        MemoryCache::new(CacheUuid::from_bytes([6; UUID_SIZE])),
    );
    (a, b)
}

fn drain_wire(actions: Vec<PipeAction>) -> Bytes {
    let mut out = BytesMut::new();
    for action in actions {
        if let PipeAction::SendWire(bytes) = action {
            out.extend_from_slice(&bytes);
        }
    }
    out.freeze()
}

fn drain_plaintext(actions: &[PipeAction]) -> BytesMut {
    let mut out = BytesMut::new();
    for action in actions {
        if let PipeAction::DeliverPlaintext(bytes) = action {
            out.extend_from_slice(bytes);
        }
    }
    out
}

proptest! {
    #[test]
    fn redundant_corpus_round_trips_exactly(
        seed in any::<u64>(),
        approx_len in 256usize..32_768,
    ) {
        let corpus = redundant_corpus(seed, approx_len);
        let (mut a, mut b) = new_pair();

        let actions = a.encode_plaintext(&corpus).expect("encode succeeds");
        let wire = drain_wire(actions);

        let actions = b.receive_wire_bytes(&wire).expect("decode succeeds");
        let output = drain_plaintext(&actions);

        prop_assert_eq!(output.as_ref(), corpus.as_slice());
    }

    #[test]
    fn redundant_corpus_round_trips_across_a_close(
        seed in any::<u64>(),
        approx_len in 256usize..32_768,
    ) {
        let corpus = redundant_corpus(seed, approx_len);
        let (mut a, mut b) = new_pair();

        let mut wire = BytesMut::new();
        wire.extend_from_slice(&drain_wire(a.encode_plaintext(&corpus).expect("encode succeeds")));
        wire.extend_from_slice(&drain_wire(a.close_plaintext().expect("close succeeds")));

        let actions = b.receive_wire_bytes(&wire).expect("decode succeeds");
        let output = drain_plaintext(&actions);

        prop_assert_eq!(output.as_ref(), corpus.as_slice());
    }
}
