//! Seeded generation of plaintext corpora with deliberate redundancy.
//!
//! Random bytes alone rarely repeat a 64-byte window, so a corpus built
//! purely from `rng.fill_bytes` would never exercise the `ASK`/`LEARN`
//! path. This draws from a small pool of fixed chunks and repeats them in a
//! random order, guaranteeing cross-chunk redundancy while still varying
//! the overall shape of the stream from one seed to the next.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Builds a plaintext stream of roughly `approx_len` bytes from `seed`,
/// drawing repeated chunks from a small pool so the stream is guaranteed to
/// contain redundant 64-byte windows.
#[must_use]
pub fn redundant_corpus(seed: u64, approx_len: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let pool: Vec<Vec<u8>> = (0..6)
        .map(|i| {
            let len = rng.gen_range(96..160);
            let mut chunk = vec![0u8; len];
            rng.fill(chunk.as_mut_slice());
            chunk[0] = i;
            chunk
        })
        .collect();

    let mut out = Vec::with_capacity(approx_len + 256);
    while out.len() < approx_len {
        let chunk = &pool[rng.gen_range(0..pool.len())];
        out.extend_from_slice(chunk);
    }
    out
}
