//! Thread-safe, byte-budgeted LRU cache of rendered escape sequences

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use tracing::debug;

/// Default byte budget used when a non-positive value is configured.
const DEFAULT_MAX_BYTES: usize = 32 * 1024 * 1024;

/// Fingerprint of a rendered image: protocol, target cell dimensions, and a
/// content hash. Equality is field-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub protocol: &'static str,
    pub cells_w: u16,
    pub cells_h: u16,
    pub hash: [u8; 32],
}

impl CacheKey {
    pub fn new(protocol: &'static str, cells_w: u16, cells_h: u16, hash: [u8; 32]) -> Self {
        Self {
            protocol,
            cells_w,
            cells_h,
            hash,
        }
    }
}

/// A cached rendered escape sequence and its byte size.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    bytes: usize,
}

/// Point-in-time cache observability counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    pub bytes: usize,
}

struct Inner {
    lru: LruCache<CacheKey, CacheEntry>,
    bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Byte-budgeted LRU cache keyed by [`CacheKey`].
///
/// Invariants: total stored bytes never exceed the configured budget after
/// any operation; every key corresponds to exactly one LRU position;
/// hit/miss/eviction counters only ever increase.
pub struct Cache {
    max_bytes: usize,
    inner: Mutex<Inner>,
}

impl Cache {
    /// `mib` is the byte budget in mebibytes. A non-positive value is
    /// replaced by 32 MiB.
    pub fn new(mib: i64) -> Self {
        let max_bytes = if mib <= 0 {
            DEFAULT_MAX_BYTES
        } else {
            mib as usize * 1024 * 1024
        };

        Self {
            max_bytes,
            inner: Mutex::new(Inner {
                // Capacity is effectively unbounded by entry count; eviction
                // is driven purely by the byte budget below.
                lru: LruCache::new(NonZeroUsize::new(usize::MAX).unwrap()),
                bytes: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        match inner.lru.get(key) {
            Some(entry) => {
                let value = entry.value.clone();
                inner.hits += 1;
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    pub fn put(&self, key: CacheKey, value: String) {
        let bytes = value.len();
        let mut inner = self.inner.lock().expect("cache lock poisoned");

        if let Some(old) = inner.lru.peek(&key) {
            inner.bytes -= old.bytes;
        }
        inner.lru.put(key, CacheEntry { value, bytes });
        inner.bytes += bytes;

        while inner.bytes > self.max_bytes {
            match inner.lru.pop_lru() {
                Some((_, evicted)) => {
                    inner.bytes -= evicted.bytes;
                    inner.evictions += 1;
                }
                None => break,
            }
        }

        debug!(bytes = inner.bytes, max_bytes = self.max_bytes, "put: cache updated");
    }

    /// Clear all entries. Hit/miss/eviction counters are left untouched —
    /// they are cumulative, monotonic observability counters.
    pub fn invalidate(&self) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.lru.clear();
        inner.bytes = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache lock poisoned");
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            entries: inner.lru.len(),
            bytes: inner.bytes,
        }
    }
}


#[cfg(test)]
impl Cache {
    /// Test-only constructor that expresses the budget directly in bytes
    /// instead of mebibytes, for exercising small eviction scenarios.
    pub(crate) fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            inner: Mutex::new(Inner {
                lru: LruCache::new(NonZeroUsize::new(usize::MAX).unwrap()),
                bytes: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }
}
