//! Fault-injection wrapper around any [`Cache`], for testing `CacheIo`
//! propagation.
//!
//! Grounded on `ChaoticStorage`: a deterministic LCG decides, per call,
//! whether to fail instead of delegating to the inner cache.

#![allow(clippy::disallowed_types, reason = "locking simple RNG state")]

use std::sync::{Arc, Mutex};

use xcodec_core::{Cache, CacheError, CacheUuid, Segment};

/// Wraps a [`Cache`] and randomly fails `enter`/`lookup` to exercise
/// `CacheIo` error propagation deterministically.
#[derive(Clone)]
pub struct ChaoticCache<C> {
    inner: C,
    failure_rate: f64,
    rng: Arc<Mutex<ChaoticRng>>,
}

struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> f64 {
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = A.wrapping_mul(self.state).wrapping_add(C) % M;
        #[allow(clippy::cast_precision_loss, reason = "approximate [0,1) draw is fine")]
        let ratio = self.state as f64 / M as f64;
        ratio
    }

    fn should_fail(&mut self, failure_rate: f64) -> bool {
        self.next() < failure_rate
    }
}

impl<C: Cache> ChaoticCache<C> {
    /// Wraps `inner`, failing calls with probability `failure_rate`.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in `[0.0, 1.0]`.
    #[must_use]
    pub fn new(inner: C, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Same as [`Self::new`] but with an explicit seed, for reproducible
    /// chaos across test runs.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in `[0.0, 1.0]`.
    #[must_use]
    pub fn with_seed(inner: C, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );
        Self { inner, failure_rate, rng: Arc::new(Mutex::new(ChaoticRng::new(seed))) }
    }

    /// The wrapped cache, for inspecting state after a chaos run.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    #[allow(clippy::expect_used)]
    fn should_fail(&self) -> bool {
        self.rng.lock().expect("ChaoticRng mutex poisoned").should_fail(self.failure_rate)
    }
}

impl<C: Cache> Cache for ChaoticCache<C> {
    fn uuid(&self) -> CacheUuid {
        self.inner.uuid()
    }

    fn enter(&mut self, hash: u64, segment: Segment) -> Result<(), CacheError> {
        if self.should_fail() {
            return Err(CacheError::Io { message: "chaotic failure injection".to_string() });
        }
        self.inner.enter(hash, segment)
    }

    fn lookup(&mut self, hash: u64) -> Result<Option<Segment>, CacheError> {
        if self.should_fail() {
            return Err(CacheError::Io { message: "chaotic failure injection".to_string() });
        }
        self.inner.lookup(hash)
    }
}
