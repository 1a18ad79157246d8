//! `CossCache`: the disk-backed cyclic object storage cache.
//!
//! Grounded on the original implementation's `XCodecCacheCOSS`: one file per
//! cache UUID, one active in-memory stripe, a startup scan that rebuilds the
//! index and picks up where the last run left off.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use xcodec_core::{Cache, CacheError, CacheUuid, Segment, UUID_SIZE};

use crate::{
    error::CossError,
    index::CossIndex,
    layout::{round_up, stripe_total_len},
    stripe::{STRIPE_HEADER_SIZE, Stripe, read_valid_header},
};

#[derive(Debug, Default)]
struct CossStats {
    lookups: u64,
    hits: u64,
    misses: u64,
}

/// A disk-backed cyclic object storage cache: one file per cache UUID,
/// divided into fixed-size stripes that are overwritten cyclically once the
/// file fills.
pub struct CossCache {
    file: File,
    path: PathBuf,
    uuid: CacheUuid,
    stripe_len: u64,
    last_stripe_n: u64,
    serial: u64,
    active: Stripe,
    index: CossIndex,
    stats: CossStats,
}

impl CossCache {
    /// Opens (or creates) a COSS cache file of at least `size_megabytes`
    /// inside `cache_dir`, generating and persisting a fresh UUID if the
    /// directory has none yet.
    ///
    /// # Errors
    ///
    /// Returns [`CossError::Io`] if the directory or file cannot be created,
    /// opened, or read.
    pub fn open(cache_dir: &Path, size_megabytes: u64) -> Result<Self, CossError> {
        std::fs::create_dir_all(cache_dir)?;
        let uuid = load_or_create_uuid(cache_dir)?;
        Self::open_for_uuid(cache_dir, uuid, size_megabytes)
    }

    /// Constructs an empty cache of the same variant for a peer's UUID,
    /// sharing this cache's directory and stripe count.
    ///
    /// # Errors
    ///
    /// Returns [`CossError::Io`] if the new cache file cannot be created.
    pub fn new_uuid(&self, uuid: CacheUuid) -> Result<Self, CossError> {
        let cache_dir = self.path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let total_bytes = self.stripe_len * (self.last_stripe_n + 1);
        let size_megabytes = (total_bytes / 1_048_576).max(1);
        Self::open_for_uuid(&cache_dir, uuid, size_megabytes)
    }

    fn open_for_uuid(cache_dir: &Path, uuid: CacheUuid, size_megabytes: u64) -> Result<Self, CossError> {
        let path = cache_dir.join(format!("{}.coss", hex(uuid.as_bytes())));
        let file = OpenOptions::new().read(true).write(true).create(true).open(&path)?;

        let stripe_len = stripe_total_len();
        let coss_size = round_up(size_megabytes.saturating_mul(1_048_576), stripe_len);
        let last_stripe_n = coss_size / stripe_len - 1;

        let mut cache = Self {
            file,
            path,
            uuid,
            stripe_len,
            last_stripe_n,
            serial: 0,
            active: Stripe::empty(0),
            index: CossIndex::new(),
            stats: CossStats::default(),
        };

        if cache.file.metadata()?.len() > 0 {
            cache.scan()?;
        }

        tracing::info!(
            path = %cache.path.display(),
            size_bytes = coss_size,
            stripe_bytes = stripe_len,
            "opened COSS cache",
        );
        Ok(cache)
    }

    fn enter_inner(&mut self, hash: u64, segment: &Segment) -> Result<(), CossError> {
        if let Some(existing) = self.lookup_inner(hash)? {
            if existing.as_bytes() != segment.as_bytes() {
                return Err(CossError::Collision { hash });
            }
            return Ok(());
        }

        if self.active.full() {
            self.seal_and_advance(true)?;
        }
        let pos = self.active.append(hash, segment.as_bytes());
        #[allow(clippy::cast_possible_truncation, reason = "SEGMENT_LEN fits in a u32")]
        let length = segment.as_bytes().len() as u32;
        self.index.insert(hash, self.active.number(), pos, length);
        Ok(())
    }

    fn lookup_inner(&mut self, hash: u64) -> Result<Option<Segment>, CossError> {
        self.stats.lookups += 1;
        let Some(entry) = self.index.get(hash) else {
            self.stats.misses += 1;
            return Ok(None);
        };
        self.stats.hits += 1;

        if entry.stripe_number == self.active.number() {
            let bytes = self.active.segment_at(entry.pos, entry.length).to_vec();
            return Ok(Some(Segment::new(bytes)?));
        }

        let bytes = self.read_segment_from_disk(entry.stripe_number, entry.pos, entry.length)?;
        if self.active.full() {
            self.seal_and_advance(true)?;
        }
        let new_pos = self.active.append(hash, &bytes);
        self.index.insert(hash, self.active.number(), new_pos, entry.length);
        Ok(Some(Segment::new(bytes)?))
    }

    fn read_segment_from_disk(
        &mut self,
        stripe_number: u64,
        pos: usize,
        length: u32,
    ) -> Result<Vec<u8>, CossError> {
        let offset = stripe_number * self.stripe_len
            + STRIPE_HEADER_SIZE as u64
            + (pos as u64) * xcodec_core::SEGMENT_LEN as u64;
        let saved = self.file.stream_position()?;
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; length as usize];
        self.file.read_exact(&mut buf)?;
        self.file.seek(SeekFrom::Start(saved))?;
        Ok(buf)
    }

    /// Seals the active stripe (if `write`), advances to the next stripe
    /// number (wrapping past `last_stripe_n`), bumps the serial, and
    /// invalidates the index entries for the stripe about to be reused.
    fn seal_and_advance(&mut self, write: bool) -> Result<(), CossError> {
        if write {
            let bytes = self.active.seal();
            let offset = self.active.number() * self.stripe_len;
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.write_all(&bytes)?;
        }

        let next_number =
            if self.active.number() == self.last_stripe_n { 0 } else { self.active.number() + 1 };
        self.serial += 1;
        self.index.delete_stripe(next_number);
        self.active.reset(self.serial, next_number);
        Ok(())
    }

    /// Flushes the active stripe to its current offset without advancing —
    /// an orderly-shutdown seal, not a rotation.
    fn flush_active(&mut self) -> Result<(), CossError> {
        let bytes = self.active.seal();
        let offset = self.active.number() * self.stripe_len;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&bytes)?;
        Ok(())
    }

    fn scan(&mut self) -> Result<(), CossError> {
        let mut winner: Option<(u64, u64, Vec<u8>)> = None; // (serial, stripe_number, stripe_bytes)

        for stripe_number in 0..=self.last_stripe_n {
            let offset = stripe_number * self.stripe_len;
            self.file.seek(SeekFrom::Start(offset))?;
            let mut buf = vec![0u8; self.stripe_len as usize];
            match self.file.read_exact(&mut buf) {
                Ok(()) => {},
                Err(error) if error.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(error) => return Err(error.into()),
            }

            let Some((serial, summary)) = read_valid_header(&buf) else {
                tracing::warn!(stripe_number, "stripe failed checksum validation, skipping");
                continue;
            };

            for slot in 0..summary.occupied_count() {
                let hash = summary.hash_at(slot);
                let size = summary.size_at(slot);
                self.index.insert(hash, stripe_number, slot, size);
            }

            if winner.as_ref().is_none_or(|(best_serial, ..)| serial >= *best_serial) {
                winner = Some((serial, stripe_number, buf));
            }
        }

        let Some((serial, stripe_number, buf)) = winner else { return Ok(()) };
        self.serial = serial;

        let candidate = Stripe::from_disk(stripe_number, &buf);
        if candidate.full() {
            self.active = candidate;
            self.seal_and_advance(false)?;
        } else {
            self.active = candidate;
        }

        Ok(())
    }
}

impl Cache for CossCache {
    fn uuid(&self) -> CacheUuid {
        self.uuid
    }

    fn enter(&mut self, hash: u64, segment: Segment) -> Result<(), CacheError> {
        self.enter_inner(hash, &segment).map_err(coss_error_to_cache_error)
    }

    fn lookup(&mut self, hash: u64) -> Result<Option<Segment>, CacheError> {
        self.lookup_inner(hash).map_err(coss_error_to_cache_error)
    }
}

impl Drop for CossCache {
    fn drop(&mut self) {
        if let Err(error) = self.flush_active() {
            tracing::warn!(%error, path = %self.path.display(), "failed to flush active stripe on close");
        }
        tracing::info!(
            path = %self.path.display(),
            lookups = self.stats.lookups,
            hits = self.stats.hits,
            misses = self.stats.misses,
            index_size = self.index.len(),
            "closing COSS cache",
        );
    }
}

fn coss_error_to_cache_error(error: CossError) -> CacheError {
    match error {
        CossError::Collision { hash } => CacheError::Collision { hash },
        other => CacheError::Io { message: other.to_string() },
    }
}

fn hex(bytes: &[u8; UUID_SIZE]) -> String {
    let mut out = String::with_capacity(UUID_SIZE * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn load_or_create_uuid(cache_dir: &Path) -> Result<CacheUuid, CossError> {
    let uuid_path = cache_dir.join("UUID");
    if let Ok(bytes) = std::fs::read(&uuid_path) {
        if let Ok(array) = <[u8; UUID_SIZE]>::try_from(bytes) {
            return Ok(CacheUuid::from_bytes(array));
        }
        tracing::warn!(path = %uuid_path.display(), "UUID file has unexpected length, regenerating");
    }

    let uuid = CacheUuid::generate(|buf| {
        if getrandom::fill(buf).is_err() {
            tracing::warn!("system randomness unavailable, falling back to a fixed UUID seed");
            buf.fill(0x5a);
        }
    });
    std::fs::write(&uuid_path, uuid.as_bytes())?;
    Ok(uuid)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn segment(byte: u8) -> Segment {
        Segment::new(vec![byte; xcodec_core::SEGMENT_LEN]).expect("valid length")
    }

    #[test]
    fn enter_then_lookup_round_trips() {
        let dir = tempdir().expect("tempdir");
        let mut cache = CossCache::open(dir.path(), 1).expect("open cache");
        cache.enter(42, segment(7)).expect("enter succeeds");
        assert_eq!(cache.lookup(42).expect("lookup succeeds"), Some(segment(7)));
    }

    #[test]
    fn re_enter_with_different_bytes_collides() {
        let dir = tempdir().expect("tempdir");
        let mut cache = CossCache::open(dir.path(), 1).expect("open cache");
        cache.enter(42, segment(7)).expect("enter succeeds");
        let err = cache.enter(42, segment(8)).expect_err("must collide");
        assert_eq!(err, CacheError::Collision { hash: 42 });
    }

    #[test]
    fn reopening_recovers_every_surviving_fingerprint() {
        let dir = tempdir().expect("tempdir");
        let uuid;
        {
            let mut cache = CossCache::open(dir.path(), 1).expect("open cache");
            uuid = cache.uuid();
            for hash in 0..100u64 {
                #[allow(clippy::cast_possible_truncation, reason = "loop index fits in u8")]
                cache.enter(hash, segment(hash as u8)).expect("enter succeeds");
            }
        }

        let mut reopened = CossCache::open(dir.path(), 1).expect("reopen cache");
        assert_eq!(reopened.uuid(), uuid);
        for hash in 0..100u64 {
            #[allow(clippy::cast_possible_truncation, reason = "loop index fits in u8")]
            let expected = segment(hash as u8);
            assert_eq!(reopened.lookup(hash).expect("lookup succeeds"), Some(expected));
        }
    }

    #[test]
    fn filling_past_last_stripe_wraps_and_evicts_stripe_zero() {
        let dir = tempdir().expect("tempdir");
        // Smallest cache: one stripe's worth rounds up to at least one stripe,
        // so request the minimum and rely on rounding to get exactly one
        // stripe's capacity (ARRAY_SIZE segments) per lap.
        let mut cache = CossCache::open(dir.path(), 1).expect("open cache");

        let array_size = crate::layout::ARRAY_SIZE as u64;
        let last_stripe_n = cache.last_stripe_n;
        let total_segments = (last_stripe_n + 1) * array_size;

        for hash in 1..=total_segments {
            #[allow(clippy::cast_possible_truncation, reason = "test data byte pattern")]
            cache.enter(hash, segment((hash % 251) as u8)).expect("enter succeeds");
        }

        // This fills the file exactly; one more entry wraps into stripe 0.
        let wrap_hash = total_segments + 1;
        cache.enter(wrap_hash, segment(9)).expect("enter succeeds after wrap");
        assert_eq!(cache.lookup(wrap_hash).expect("lookup succeeds"), Some(segment(9)));

        // The very first entry, which lived only in stripe 0, is now gone.
        assert_eq!(cache.lookup(1).expect("lookup succeeds"), None);
    }

    #[test]
    fn new_uuid_creates_a_separate_empty_cache() {
        let dir = tempdir().expect("tempdir");
        let mut cache = CossCache::open(dir.path(), 1).expect("open cache");
        cache.enter(1, segment(1)).expect("enter succeeds");

        let peer_uuid = CacheUuid::from_bytes([9; UUID_SIZE]);
        let mut peer_cache = cache.new_uuid(peer_uuid).expect("construct peer cache");
        assert_eq!(peer_cache.uuid(), peer_uuid);
        assert_eq!(peer_cache.lookup(1).expect("lookup succeeds"), None);
    }
}
