//! The pipe-pair endpoint state machine.
//!
//! Grounded on the reference implementation's `XCodecPipePair::decoder_consume`
//! / `encoder_consume`: a pure state machine, no I/O, that peeks the next
//! message off a buffer and waits for the rest to arrive before consuming it.
//! Unlike the original, this does not split "our own cache" from "a cache
//! mirroring what the peer has taught us" by peer UUID — per this
//! implementation's explicit one-cache-per-pipe-pair simplification, both
//! sides of a pipe-pair share the single cache it's constructed with; a
//! process that talks to many peers and wants per-peer cache reuse does that
//! via [`crate::CacheRegistry`] at construction time, not inside the state
//! machine.

use std::collections::HashSet;

use bytes::{Bytes, BytesMut};
use xcodec_core::{Cache, CacheError, CacheUuid, Decoder, Encoder, XCodecHash};
use xcodec_wire::{DecodeOutcome, MAX_FRAME_LEN, Message, decode};

use crate::error::{PipeError, SequenceViolation};

/// An effect the driver (the async socket loop) must carry out.
///
/// The state machine itself never touches a socket; it only describes what
/// should happen next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipeAction {
    /// Write these bytes to the peer-facing (encoded) transport.
    SendWire(Bytes),
    /// Deliver this plaintext to the application-facing transport.
    DeliverPlaintext(Bytes),
    /// Half-close the peer-facing transport's write side. Sent once both
    /// `EOS_ACK`s have crossed.
    CloseWireOutbound,
    /// Half-close the application-facing transport's write side. Sent once
    /// the peer's `EOS` has arrived and every buffered frame has decoded.
    ClosePlaintextOutbound,
}

/// One endpoint of an XCodec pipe-pair.
///
/// Generic over the [`Cache`] implementation so the same state machine
/// drives both an in-memory cache (tests, ephemeral runs) and a disk-backed
/// `xcodec-coss` cache.
#[derive(Debug)]
pub struct PipePair<C> {
    cache: C,
    local_uuid: CacheUuid,
    peer_uuid: Option<CacheUuid>,
    encoder: Encoder,
    decoder: Decoder,
    wire_in: BytesMut,
    asked_hashes: HashSet<u64>,
    sent_hello: bool,
    sent_local_eos: bool,
    sent_eos_ack: bool,
    received_peer_eos: bool,
    received_peer_eos_ack: bool,
    delivered_plaintext_eos: bool,
    closed_wire_outbound: bool,
}

impl<C: Cache> PipePair<C> {
    /// Creates a pipe-pair advertising `local_uuid` over its first outbound
    /// message, backed by `cache`.
    pub fn new(local_uuid: CacheUuid, cache: C) -> Self {
        Self {
            cache,
            local_uuid,
            peer_uuid: None,
            encoder: Encoder::new(),
            decoder: Decoder::new(),
            wire_in: BytesMut::new(),
            asked_hashes: HashSet::new(),
            sent_hello: false,
            sent_local_eos: false,
            sent_eos_ack: false,
            received_peer_eos: false,
            received_peer_eos_ack: false,
            delivered_plaintext_eos: false,
            closed_wire_outbound: false,
        }
    }

    /// The cache UUID this pipe-pair identifies itself with.
    #[must_use]
    pub fn local_uuid(&self) -> CacheUuid {
        self.local_uuid
    }

    /// The peer's advertised cache UUID, once its `HELLO` has arrived.
    #[must_use]
    pub fn peer_uuid(&self) -> Option<CacheUuid> {
        self.peer_uuid
    }

    /// The backing cache, for inspection in tests or graceful shutdown.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Mutable access to the backing cache, for pre-seeding it in tests or
    /// for a driver that wants to share one cache across several pipe-pairs.
    pub fn cache_mut(&mut self) -> &mut C {
        &mut self.cache
    }

    /// Whether both directions have fully completed the `EOS`/`EOS_ACK`
    /// handshake and the wire-facing channel has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed_wire_outbound
    }

    /// Encodes `input` and frames it for the wire, sending `HELLO` first if
    /// this is the first outbound message.
    ///
    /// A no-op (returns no actions) if `input` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceViolation::PlaintextAfterLocalEos`] if called after
    /// [`PipePair::close_plaintext`], or a codec/cache error from encoding.
    pub fn encode_plaintext(&mut self, input: &[u8]) -> Result<Vec<PipeAction>, PipeError> {
        if self.sent_local_eos {
            return Err(SequenceViolation::PlaintextAfterLocalEos.into());
        }
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let mut wire = BytesMut::new();
        self.send_hello_if_needed(&mut wire)?;

        let mut encoded = BytesMut::new();
        self.encoder.encode(&mut self.cache, &mut encoded, input)?;
        frame_encoded(&mut wire, &encoded)?;

        Ok(vec![PipeAction::SendWire(wire.freeze())])
    }

    /// Flushes any buffered plaintext and sends `EOS`, marking this side as
    /// having no more data to encode.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceViolation::PlaintextAfterLocalEos`] if called twice.
    pub fn close_plaintext(&mut self) -> Result<Vec<PipeAction>, PipeError> {
        if self.sent_local_eos {
            return Err(SequenceViolation::PlaintextAfterLocalEos.into());
        }

        let mut wire = BytesMut::new();
        self.send_hello_if_needed(&mut wire)?;

        let mut encoded = BytesMut::new();
        self.encoder.flush(&mut encoded);
        frame_encoded(&mut wire, &encoded)?;

        Message::Eos.encode(&mut wire)?;
        self.sent_local_eos = true;

        Ok(vec![PipeAction::SendWire(wire.freeze())])
    }

    /// Feeds bytes just read from the wire-facing transport, returning the
    /// actions the driver must execute in response.
    ///
    /// # Errors
    ///
    /// Returns a [`PipeError`] on malformed framing, an out-of-sequence
    /// message, an unresolvable `ASK`, or a `LEARN` collision.
    pub fn receive_wire_bytes(&mut self, input: &[u8]) -> Result<Vec<PipeAction>, PipeError> {
        self.wire_in.extend_from_slice(input);

        let mut actions = Vec::new();
        let mut outgoing = BytesMut::new();

        loop {
            let (message, consumed) = match decode(&self.wire_in)? {
                DecodeOutcome::Message { message, consumed } => (message, consumed),
                DecodeOutcome::Incomplete => break,
            };

            let frame_payload = self.handle_message(message, &mut outgoing)?;
            self.attempt_decode_and_ask(
                frame_payload.as_deref().unwrap_or(&[]),
                &mut actions,
                &mut outgoing,
            )?;
            let _ = self.wire_in.split_to(consumed);
            self.maybe_complete(&mut actions, &mut outgoing)?;
        }

        if !outgoing.is_empty() {
            actions.push(PipeAction::SendWire(outgoing.freeze()));
        }
        Ok(actions)
    }

    /// Feeds the wire-facing transport's read-side EOF.
    ///
    /// A clean shutdown only ever reaches this point after both sides have
    /// exchanged `EOS`/`EOS_ACK`; the driver should treat any other EOF as
    /// an abrupt peer disconnect and tear the connection down.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceViolation::PeerClosedWireAbruptly`] if the peer
    /// closed before this side had sent `EOS`, or with data still buffered
    /// or undecoded.
    pub fn receive_wire_eof(&mut self) -> Result<Vec<PipeAction>, PipeError> {
        if !self.wire_in.is_empty() || !self.decoder.is_idle() || !self.sent_local_eos {
            return Err(SequenceViolation::PeerClosedWireAbruptly.into());
        }

        let mut actions = Vec::new();
        if !self.delivered_plaintext_eos {
            actions.push(PipeAction::ClosePlaintextOutbound);
            self.delivered_plaintext_eos = true;
        }
        Ok(actions)
    }

    fn send_hello_if_needed(&mut self, wire: &mut BytesMut) -> Result<(), PipeError> {
        if !self.sent_hello {
            Message::Hello(self.local_uuid).encode(wire)?;
            self.sent_hello = true;
        }
        Ok(())
    }

    /// Applies the sequencing rules for one decoded message and performs any
    /// cache/encoder side effects it carries. Returns the payload of a
    /// `Frame` message, if that's what this was, for the caller to hand to
    /// the decoder — every other message type hands the decoder nothing new
    /// but may still have unblocked it (a `LEARN` resolving a reference), so
    /// the caller always attempts a decode resume afterward regardless.
    fn handle_message(
        &mut self,
        message: Message,
        outgoing: &mut BytesMut,
    ) -> Result<Option<Bytes>, PipeError> {
        match message {
            Message::Hello(uuid) => {
                if self.peer_uuid.is_some() {
                    return Err(SequenceViolation::DuplicateHello.into());
                }
                tracing::debug!(?uuid, "peer advertised cache uuid");
                self.peer_uuid = Some(uuid);
            },
            Message::Ask(hash) => {
                if !self.sent_hello {
                    return Err(SequenceViolation::AskBeforeHello.into());
                }
                match self.cache.lookup(hash)? {
                    Some(segment) => Message::Learn(segment).encode(outgoing)?,
                    None => return Err(SequenceViolation::UnknownAskHash { hash }.into()),
                }
            },
            Message::Learn(segment) => {
                if self.peer_uuid.is_none() {
                    return Err(SequenceViolation::LearnBeforeHello.into());
                }
                let hash = XCodecHash::reset(segment.as_bytes())?.value();
                self.asked_hashes.remove(&hash);
                self.decoder.resolve(hash);

                match self.cache.lookup(hash)? {
                    Some(existing) if existing != segment => {
                        return Err(CacheError::Collision { hash }.into());
                    },
                    Some(_) => tracing::debug!(hash, "redundant LEARN"),
                    None => {
                        self.cache.enter(hash, segment)?;
                        tracing::debug!(hash, "learned segment from peer");
                    },
                }
            },
            Message::Eos => {
                if self.received_peer_eos {
                    return Err(SequenceViolation::DuplicateEos.into());
                }
                self.received_peer_eos = true;
            },
            Message::EosAck => {
                if !self.sent_local_eos {
                    return Err(SequenceViolation::EosAckBeforeEos.into());
                }
                if self.received_peer_eos_ack {
                    return Err(SequenceViolation::DuplicateEosAck.into());
                }
                self.received_peer_eos_ack = true;
            },
            Message::Frame(payload) => {
                if self.peer_uuid.is_none() {
                    return Err(SequenceViolation::FrameBeforeHello.into());
                }
                return Ok(Some(payload));
            },
        }
        Ok(None)
    }

    /// Feeds `input` (a `Frame` payload, or nothing) to the decoder and
    /// turns whatever it produces into actions: delivered plaintext, and an
    /// `ASK` for every fingerprint the decoder can't yet resolve.
    ///
    /// Safe to call with an empty `input` purely to retry: the decoder only
    /// processes buffered bytes once every outstanding hash from a prior
    /// call has resolved, so this is how a `LEARN` unblocks a reference that
    /// arrived in an earlier `Frame`.
    fn attempt_decode_and_ask(
        &mut self,
        input: &[u8],
        actions: &mut Vec<PipeAction>,
        outgoing: &mut BytesMut,
    ) -> Result<(), PipeError> {
        let mut decoded = BytesMut::new();
        self.decoder.decode(&mut self.cache, &mut decoded, input)?;
        if !decoded.is_empty() {
            actions.push(PipeAction::DeliverPlaintext(decoded.freeze()));
        }

        let unknown: Vec<u64> = self.decoder.unknown_hashes().iter().copied().collect();
        for hash in unknown {
            if self.asked_hashes.insert(hash) {
                tracing::debug!(hash, "asking peer for unknown segment");
                Message::Ask(hash).encode(outgoing)?;
            }
        }
        Ok(())
    }

    /// After each processed message, checks whether the EOS/EOS_ACK
    /// discipline now permits advancing: sending `EOS_ACK` once the peer's
    /// `EOS` has arrived and decoding is fully caught up, and closing the
    /// wire-facing channel once both `EOS_ACK`s have crossed.
    fn maybe_complete(
        &mut self,
        actions: &mut Vec<PipeAction>,
        outgoing: &mut BytesMut,
    ) -> Result<(), PipeError> {
        if self.received_peer_eos && !self.sent_eos_ack && self.decoder.is_idle() {
            Message::EosAck.encode(outgoing)?;
            self.sent_eos_ack = true;

            if !self.delivered_plaintext_eos {
                actions.push(PipeAction::ClosePlaintextOutbound);
                self.delivered_plaintext_eos = true;
            }
        }

        if self.sent_eos_ack && self.received_peer_eos_ack && !self.closed_wire_outbound {
            actions.push(PipeAction::CloseWireOutbound);
            self.closed_wire_outbound = true;
        }
        Ok(())
    }
}

fn frame_encoded(wire: &mut BytesMut, encoded: &[u8]) -> Result<(), PipeError> {
    let max = usize::from(MAX_FRAME_LEN);
    let mut offset = 0;
    while offset < encoded.len() {
        let end = (offset + max).min(encoded.len());
        Message::Frame(Bytes::copy_from_slice(&encoded[offset..end])).encode(wire)?;
        offset = end;
    }
    Ok(())
}
