//! Per-connection cache selection.
//!
//! Each accepted connection gets its own cache instance: either an ephemeral
//! [`MemoryCache`] seeded with a fresh random UUID, or a [`CossCache`] opened
//! under its own subdirectory of a configured cache directory. Both
//! implement `xcodec_core::Cache`, but `PipePair<C>` is generic over a single
//! concrete `C`, so this enum gives the listener one type to hand it
//! regardless of which backing a given run was configured with.

use std::path::{Path, PathBuf};

use xcodec_core::{Cache, CacheError, CacheUuid, Segment};
use xcodec_coss::CossCache;

use crate::error::ProxyError;

/// Where newly accepted connections should look for cache storage.
#[derive(Debug, Clone)]
pub enum CacheBacking {
    /// No directory was configured: every connection gets an empty,
    /// in-process cache that vanishes when the connection closes.
    Ephemeral,
    /// A directory was configured: every connection gets its own
    /// subdirectory and a `CossCache` of the given size.
    Coss {
        /// Root directory; each connection opens `root/conn-<n>`.
        root: PathBuf,
        /// Size passed to `CossCache::open` for each connection's cache.
        size_megabytes: u64,
    },
}

impl CacheBacking {
    /// Opens a fresh cache for one connection, tagged with `connection_id`
    /// to pick a distinct subdirectory under a COSS root.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Coss`] if the COSS cache file cannot be created
    /// or opened.
    pub fn open_for_connection(&self, connection_id: u64) -> Result<AnyCache, ProxyError> {
        match self {
            Self::Ephemeral => {
                let uuid = CacheUuid::generate(|buf| {
                    if getrandom::fill(buf).is_err() {
                        tracing::warn!(
                            "system randomness unavailable, falling back to a fixed cache uuid seed"
                        );
                        buf.fill(0x5a);
                    }
                });
                Ok(AnyCache::Memory(xcodec_core::MemoryCache::new(uuid)))
            },
            Self::Coss { root, size_megabytes } => {
                let dir: &Path = root;
                let connection_dir = dir.join(format!("conn-{connection_id}"));
                let cache = CossCache::open(&connection_dir, *size_megabytes)?;
                Ok(AnyCache::Coss(cache))
            },
        }
    }
}

/// A cache backing picked at runtime, either an in-memory cache or a
/// disk-backed COSS cache.
pub enum AnyCache {
    /// In-process, ephemeral.
    Memory(xcodec_core::MemoryCache),
    /// Disk-backed.
    Coss(CossCache),
}

impl Cache for AnyCache {
    fn uuid(&self) -> CacheUuid {
        match self {
            Self::Memory(cache) => cache.uuid(),
            Self::Coss(cache) => cache.uuid(),
        }
    }

    fn enter(&mut self, hash: u64, segment: Segment) -> Result<(), CacheError> {
        match self {
            Self::Memory(cache) => cache.enter(hash, segment),
            Self::Coss(cache) => cache.enter(hash, segment),
        }
    }

    fn lookup(&mut self, hash: u64) -> Result<Option<Segment>, CacheError> {
        match self {
            Self::Memory(cache) => cache.lookup(hash),
            Self::Coss(cache) => cache.lookup(hash),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn ephemeral_backing_gives_each_connection_a_distinct_empty_cache() {
        let backing = CacheBacking::Ephemeral;
        let mut one = backing.open_for_connection(0).expect("opens");
        let mut two = backing.open_for_connection(1).expect("opens");

        assert_ne!(one.uuid(), two.uuid());
        assert_eq!(one.lookup(42).expect("lookup succeeds"), None);
        assert_eq!(two.lookup(42).expect("lookup succeeds"), None);
    }

    #[test]
    fn coss_backing_opens_a_distinct_subdirectory_per_connection() {
        let dir = tempdir().expect("tempdir");
        let backing = CacheBacking::Coss { root: dir.path().to_path_buf(), size_megabytes: 1 };

        let mut one = backing.open_for_connection(0).expect("opens");
        let mut two = backing.open_for_connection(1).expect("opens");
        assert_ne!(one.uuid(), two.uuid());

        let pattern: Vec<u8> = (0..xcodec_core::SEGMENT_LEN as u8).collect();
        let segment = Segment::new(pattern.clone()).expect("valid length");
        let hash = xcodec_core::XCodecHash::reset(&pattern).expect("valid window").value();
        one.enter(hash, segment).expect("enter succeeds");

        assert_eq!(two.lookup(hash).expect("lookup succeeds"), None);
        assert!(dir.path().join("conn-0").exists());
        assert!(dir.path().join("conn-1").exists());
    }
}
