//! Search result cache
//!
//! Deduplicating, short-lived cache keyed by the canonical criteria digest.
//! Entries live under a sliding window (re-touched on read) bounded by an
//! absolute ceiling from creation, which bounds staleness of geographic data
//! as inspectors move or change status. Payloads above a size threshold are
//! gzip-compressed before storage and transparently decompressed on read.
//!
//! Caching is best-effort throughout: compression or decompression trouble
//! degrades to a miss and is logged, never propagated. The cache is an
//! explicit injectable component so tests can substitute [`NoopSearchCache`].

use chrono::{DateTime, Duration, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::RwLock;
use tracing::warn;

/// Cache of serialized result pages
///
/// Implementations must be safe under concurrent reads and writes. Callers
/// get eventual coherence within the expiration window only: concurrent
/// identical searches may each compute the result before one of them
/// populates the cache (no single-flight deduplication).
pub trait SearchCache: Send + Sync {
    /// Fetch a previously stored payload; `None` on miss or expiry
    fn get(&self, key: &str, now: DateTime<Utc>) -> Option<Vec<u8>>;

    /// Store a payload, replacing any existing entry for the key
    fn put(&self, key: &str, payload: &[u8], now: DateTime<Utc>);
}

/// Tuning knobs for [`InMemorySearchCache`]
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Sliding expiration window, re-touched on every read
    pub sliding_ttl: Duration,
    /// Absolute ceiling from entry creation; evicted past this even if
    /// continuously read
    pub absolute_ttl: Duration,
    /// Payloads at or above this many bytes are gzip-compressed
    pub compression_threshold: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            sliding_ttl: Duration::seconds(60),
            absolute_ttl: Duration::seconds(300),
            compression_threshold: 4096,
        }
    }
}

struct CacheEntry {
    payload: Vec<u8>,
    compressed: bool,
    created_at: DateTime<Utc>,
    last_touched: DateTime<Utc>,
}

impl CacheEntry {
    fn expired(&self, now: DateTime<Utc>, settings: &CacheSettings) -> bool {
        now - self.created_at >= settings.absolute_ttl
            || now - self.last_touched >= settings.sliding_ttl
    }
}

/// Process-wide in-memory cache
pub struct InMemorySearchCache {
    settings: CacheSettings,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemorySearchCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn compress(payload: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload)?;
        encoder.finish()
    }

    fn decompress(payload: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut decoder = GzDecoder::new(payload);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }
}

impl Default for InMemorySearchCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

impl SearchCache for InMemorySearchCache {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Option<Vec<u8>> {
        let mut entries = self.entries.write().expect("cache lock poisoned");

        let expired = match entries.get(key) {
            Some(entry) => entry.expired(now, &self.settings),
            None => return None,
        };
        if expired {
            entries.remove(key);
            return None;
        }

        let entry = entries.get_mut(key)?;
        entry.last_touched = now;

        if !entry.compressed {
            return Some(entry.payload.clone());
        }
        match Self::decompress(&entry.payload) {
            Ok(payload) => Some(payload),
            Err(e) => {
                // Undecodable entry is useless; drop it and report a miss
                warn!("Cache entry for {key} failed to decompress, evicting: {e}");
                entries.remove(key);
                None
            }
        }
    }

    fn put(&self, key: &str, payload: &[u8], now: DateTime<Utc>) {
        let (stored, compressed) = if payload.len() >= self.settings.compression_threshold {
            match Self::compress(payload) {
                Ok(compressed) => (compressed, true),
                Err(e) => {
                    warn!("Cache compression failed, storing entry uncompressed: {e}");
                    (payload.to_vec(), false)
                }
            }
        } else {
            (payload.to_vec(), false)
        };

        let mut entries = self.entries.write().expect("cache lock poisoned");
        // Opportunistic sweep keeps the map from accumulating dead entries
        // between reads of cold keys
        entries.retain(|_, entry| !entry.expired(now, &self.settings));
        entries.insert(
            key.to_string(),
            CacheEntry {
                payload: stored,
                compressed,
                created_at: now,
                last_touched: now,
            },
        );
    }
}

/// Cache that stores nothing; every lookup misses
///
/// Used by tests and cache-off deployments.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSearchCache;

impl SearchCache for NoopSearchCache {
    fn get(&self, _key: &str, _now: DateTime<Utc>) -> Option<Vec<u8>> {
        None
    }

    fn put(&self, _key: &str, _payload: &[u8], _now: DateTime<Utc>) {}
}
