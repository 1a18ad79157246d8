//! Exercises `PipePair` end to end against a real disk-backed cache,
//! rather than the in-process `MemoryCache` used by the unit tests.

use tempfile::tempdir;
use xcodec_core::CacheUuid;
use xcodec_coss::CossCache;
use xcodec_pipe::{PipeAction, PipePair};

fn drain_wire(actions: Vec<PipeAction>) -> bytes::Bytes {
    let mut out = bytes::BytesMut::new();
    for action in actions {
        if let PipeAction::SendWire(bytes) = action {
            out.extend_from_slice(&bytes);
        }
    }
    out.freeze()
}

fn drain_plaintext(actions: &[PipeAction]) -> bytes::BytesMut {
    let mut out = bytes::BytesMut::new();
    for action in actions {
        if let PipeAction::DeliverPlaintext(bytes) = action {
            out.extend_from_slice(bytes);
        }
    }
    out
}

#[test]
fn plaintext_round_trips_through_two_coss_backed_pipe_pairs() {
    let dir_a = tempdir().expect("tempdir");
    let dir_b = tempdir().expect("tempdir");

    let uuid_a = CacheUuid::from_bytes([7; xcodec_core::UUID_SIZE]);
    let uuid_b = CacheUuid::from_bytes([8; xcodec_core::UUID_SIZE]);

    let mut a = PipePair::new(uuid_a, CossCache::open(dir_a.path(), 1).expect("open cache"));
    let mut b = PipePair::new(uuid_b, CossCache::open(dir_b.path(), 1).expect("open cache"));

    let input = b"the quick brown fox jumps over the lazy dog".repeat(4);

    let wire = drain_wire(a.encode_plaintext(&input).expect("encode succeeds"));
    let actions = b.receive_wire_bytes(&wire).expect("decode succeeds");
    let output = drain_plaintext(&actions);
    assert_eq!(output.as_ref(), input.as_slice());

    let wire = drain_wire(a.close_plaintext().expect("close succeeds"));
    let actions_b = b.receive_wire_bytes(&wire).expect("handles EOS");
    assert!(actions_b.contains(&PipeAction::ClosePlaintextOutbound));

    let eos_ack_wire = drain_wire(actions_b);
    let wire_b_eos = drain_wire(b.close_plaintext().expect("close succeeds"));
    let actions_a = a.receive_wire_bytes(&wire_b_eos).expect("handles EOS");
    assert!(actions_a.contains(&PipeAction::ClosePlaintextOutbound));

    let actions_a2 = a.receive_wire_bytes(&eos_ack_wire).expect("handles EOS_ACK");
    assert!(actions_a2.contains(&PipeAction::CloseWireOutbound));
    assert!(a.is_closed());
}

#[test]
fn segment_learned_through_ask_persists_in_the_coss_cache() {
    let dir_a = tempdir().expect("tempdir");
    let dir_b = tempdir().expect("tempdir");

    let uuid_a = CacheUuid::from_bytes([9; xcodec_core::UUID_SIZE]);
    let uuid_b = CacheUuid::from_bytes([10; xcodec_core::UUID_SIZE]);

    let mut a = PipePair::new(uuid_a, CossCache::open(dir_a.path(), 1).expect("open cache"));
    let mut b = PipePair::new(uuid_b, CossCache::open(dir_b.path(), 1).expect("open cache"));

    let pattern: Vec<u8> = (0..xcodec_core::SEGMENT_LEN as u8).collect();
    let fingerprint = xcodec_core::XCodecHash::reset(&pattern).expect("valid window").value();
    a.cache_mut()
        .enter(fingerprint, xcodec_core::Segment::new(pattern.clone()).expect("valid length"))
        .expect("enter succeeds");

    let wire = drain_wire(a.encode_plaintext(&pattern).expect("encode succeeds"));
    let actions_b = b.receive_wire_bytes(&wire).expect("decode succeeds");
    assert!(drain_plaintext(&actions_b).is_empty());
    let ask = drain_wire(actions_b);

    let learn = drain_wire(a.receive_wire_bytes(&ask).expect("handles ASK"));
    let actions_b2 = b.receive_wire_bytes(&learn).expect("handles LEARN");
    assert_eq!(drain_plaintext(&actions_b2).as_ref(), pattern.as_slice());

    assert_eq!(b.cache_mut().lookup(fingerprint).expect("lookup succeeds"), Some(
        xcodec_core::Segment::new(pattern).expect("valid length")
    ));
}
