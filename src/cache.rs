//! Content-addressed LRU cache.
//!
//! A [`Session`](crate::session::Session) keeps three of these: uploads keyed
//! by their PDF bytes, rendered page sequences keyed by the materialized file
//! path, and OCR text keyed by the exact PNG bytes of a page. Keys are SHA-256
//! digests so the cache never holds a second copy of the content it is keyed
//! on, and capacity is bounded by LRU eviction.

use lru::LruCache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;

/// Hex-encoded SHA-256 digest identifying a cache entry.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ContentKey(String);

impl ContentKey {
    /// Key for a byte buffer (uploads, page images).
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hex::encode(hasher.finalize()))
    }

    /// Key for a filesystem path. Only the path is hashed, not the file.
    pub fn of_path(path: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"path:");
        hasher.update(path.as_os_str().as_encoded_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hit/miss counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

/// Bounded map from [`ContentKey`] to a cheaply clonable value.
///
/// Values are handed out by clone, so store `Arc`s for anything large.
pub struct ContentCache<V> {
    entries: LruCache<ContentKey, V>,
    hits: u64,
    misses: u64,
}

impl<V: Clone> ContentCache<V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(size),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up `key`, marking it most recently used.
    pub fn get(&mut self, key: &ContentKey) -> Option<V> {
        match self.entries.get(key) {
            Some(v) => {
                self.hits += 1;
                Some(v.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Check for `key` without touching recency or counters.
    pub fn contains(&self, key: &ContentKey) -> bool {
        self.entries.contains(key)
    }

    /// Insert a value, returning the evicted entry if the cache was full.
    pub fn insert(&mut self, key: ContentKey, value: V) -> Option<(ContentKey, V)> {
        self.entries.push(key, value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove and return every value, least recently used first.
    pub fn drain(&mut self) -> Vec<V> {
        let mut out = Vec::with_capacity(self.entries.len());
        while let Some((_, v)) = self.entries.pop_lru() {
            out.push(v);
        }
        out
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
            capacity: self.entries.cap().get(),
        }
    }
}
