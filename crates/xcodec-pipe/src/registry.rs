//! Process-wide map from cache UUID to cache instance.
//!
//! Replaces the original implementation's global `XCodecCache::lookup` /
//! `XCodecCache::enter` table with an explicit value threaded through
//! whoever is wiring up pipe-pairs (the proxy's connection acceptor). A
//! "current local cache" global is an artefact of the original's
//! initialisation order, not a property the protocol itself needs.

use std::collections::HashMap;

use xcodec_core::CacheUuid;

/// Owns every cache this process has instantiated, keyed by the UUID each
/// one advertises over `HELLO`.
#[derive(Debug, Default)]
pub struct CacheRegistry<C> {
    caches: HashMap<CacheUuid, C>,
}

impl<C> CacheRegistry<C> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { caches: HashMap::new() }
    }

    /// Number of caches currently registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Whether the registry holds no caches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Returns the cache registered for `uuid`, constructing and
    /// registering one via `create` if this is the first time `uuid` has
    /// been seen.
    pub fn get_or_create(&mut self, uuid: CacheUuid, create: impl FnOnce() -> C) -> &mut C {
        self.caches.entry(uuid).or_insert_with(create)
    }

    /// The cache registered for `uuid`, if any.
    pub fn get_mut(&mut self, uuid: CacheUuid) -> Option<&mut C> {
        self.caches.get_mut(&uuid)
    }
}
