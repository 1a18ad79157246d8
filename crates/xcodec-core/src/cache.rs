//! The cache capability shared by every cache variant (in-memory, COSS, ...).
//!
//! Grounded on the original implementation's `XCodecCache` base class: one
//! capability set — enter, lookup, construct-for-a-new-uuid — shared by every
//! variant. Modelled here as a trait rather than tagged variants, since a
//! disk-backed implementation (`xcodec-coss`) lives in a separate crate and
//! cannot be a variant of an enum defined here.

use std::collections::HashMap;

use crate::{error::CacheError, segment::Segment};

/// Length in bytes of a cache UUID.
pub const UUID_SIZE: usize = 16;

/// Opaque 16-byte identifier for a cache instance.
///
/// Generated once per cache and persisted alongside it; advertised on the
/// wire by the `HELLO` message.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheUuid([u8; UUID_SIZE]);

impl CacheUuid {
    /// Wraps raw bytes as a UUID.
    #[must_use]
    pub fn from_bytes(bytes: [u8; UUID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Borrows the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; UUID_SIZE] {
        &self.0
    }

    /// Generates a UUID from a caller-supplied source of randomness.
    ///
    /// Takes a closure rather than depending on a specific RNG crate so that
    /// production code can use cryptographic randomness and simulation code
    /// can use a seeded one.
    pub fn generate(mut random_bytes: impl FnMut(&mut [u8])) -> Self {
        let mut bytes = [0u8; UUID_SIZE];
        random_bytes(&mut bytes);
        Self(bytes)
    }
}

impl std::fmt::Debug for CacheUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// A mapping from 64-bit fingerprint to 64-byte segment.
///
/// Implementations must serialise their own internal mutation: a cache is
/// exclusively owned by the event loop (or task) driving the pipe-pair(s)
/// that use it, never touched concurrently.
pub trait Cache {
    /// This cache instance's UUID.
    fn uuid(&self) -> CacheUuid;

    /// Enters a segment under a fingerprint.
    ///
    /// Idempotent if `hash` already maps to byte-identical content.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Collision`] if `hash` already maps to a
    /// different segment, or [`CacheError::Io`] if the backing store fails.
    fn enter(&mut self, hash: u64, segment: Segment) -> Result<(), CacheError>;

    /// Looks up a segment by fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the backing store fails.
    fn lookup(&mut self, hash: u64) -> Result<Option<Segment>, CacheError>;
}

/// A plain in-memory cache: a hash map from fingerprint to segment.
///
/// Grounded on the original implementation's `XCodecMemoryCache`.
#[derive(Debug)]
pub struct MemoryCache {
    uuid: CacheUuid,
    entries: HashMap<u64, Segment>,
}

impl MemoryCache {
    /// Creates a new, empty in-memory cache with the given UUID.
    #[must_use]
    pub fn new(uuid: CacheUuid) -> Self {
        Self { uuid, entries: HashMap::new() }
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Cache for MemoryCache {
    fn uuid(&self) -> CacheUuid {
        self.uuid
    }

    fn enter(&mut self, hash: u64, segment: Segment) -> Result<(), CacheError> {
        match self.entries.get(&hash) {
            Some(existing) if existing != &segment => Err(CacheError::Collision { hash }),
            Some(_) => Ok(()),
            None => {
                self.entries.insert(hash, segment);
                Ok(())
            },
        }
    }

    fn lookup(&mut self, hash: u64) -> Result<Option<Segment>, CacheError> {
        Ok(self.entries.get(&hash).cloned())
    }
}
