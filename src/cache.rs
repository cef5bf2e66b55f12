//! Thread-safe cache of compiled regexes.
//!
//! Keys are SHA-256 digests over `flags ‖ pattern`, so the same pattern
//! compiled with different flags occupies distinct slots. Entries expire
//! after a TTL and the least-recently-used entry is evicted when the
//! cache is full. The read path takes the lock shared; insertion,
//! eviction, and sweeping take it exclusive. Recency and use counts are
//! atomics inside each entry so hits never need the write lock.

use crate::error::{Result, SearchError};
use ahash::AHashMap;
use regex::bytes::{Regex, RegexBuilder};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Default maximum number of cached regexes.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

type CacheKey = [u8; 32];

struct CacheEntry {
    regex: Arc<Regex>,
    pattern: String,
    case_insensitive: bool,
    created_at: Instant,
    /// Milliseconds since the cache was constructed.
    last_used_ms: AtomicU64,
    use_count: AtomicU64,
}

/// Aggregate cache counters.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_rate: f64,
    pub ttl: Duration,
}

/// Introspection record for one cached pattern.
#[derive(Debug, Clone)]
pub struct CachedPatternInfo {
    pub pattern: String,
    pub case_insensitive: bool,
    pub age: Duration,
    pub idle: Duration,
    pub use_count: u64,
}

/// LRU/TTL cache of compiled regexes.
pub struct RegexCache {
    entries: RwLock<AHashMap<CacheKey, CacheEntry>>,
    capacity: usize,
    ttl: Duration,
    epoch: Instant,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    last_sweep_ms: AtomicU64,
}

impl RegexCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    #[must_use]
    pub fn with_limits(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(AHashMap::new()),
            capacity: capacity.max(1),
            ttl,
            epoch: Instant::now(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            last_sweep_ms: AtomicU64::new(0),
        }
    }

    fn key(pattern: &str, case_insensitive: bool) -> CacheKey {
        let mut hasher = Sha256::new();
        hasher.update([u8::from(case_insensitive)]);
        hasher.update(pattern.as_bytes());
        hasher.finalize().into()
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Returns the cached regex for `(pattern, flags)`, compiling and
    /// inserting it on a miss.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` when the regex fails to compile.
    pub fn get_or_compile(&self, pattern: &str, case_insensitive: bool) -> Result<Arc<Regex>> {
        self.sweep_if_due();

        let key = Self::key(pattern, case_insensitive);
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = entries.get(&key) {
                if entry.created_at.elapsed() < self.ttl {
                    entry.last_used_ms.store(self.now_ms(), Ordering::Relaxed);
                    entry.use_count.fetch_add(1, Ordering::Relaxed);
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Arc::clone(&entry.regex));
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| SearchError::InvalidPattern(e.to_string()))?;
        let regex = Arc::new(regex);

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Expired slot for the same key is simply replaced below.
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            if let Some(lru) = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used_ms.load(Ordering::Relaxed))
                .map(|(k, _)| *k)
            {
                entries.remove(&lru);
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                regex: Arc::clone(&regex),
                pattern: pattern.to_string(),
                case_insensitive,
                created_at: Instant::now(),
                last_used_ms: AtomicU64::new(self.now_ms()),
                use_count: AtomicU64::new(1),
            },
        );
        Ok(regex)
    }

    /// Drops expired entries when a sweep interval (TTL/4) has elapsed
    /// since the previous sweep.
    fn sweep_if_due(&self) {
        let interval = (self.ttl / 4).as_millis() as u64;
        if interval == 0 {
            return;
        }
        let now = self.now_ms();
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        if now.saturating_sub(last) < interval {
            return;
        }
        if self
            .last_sweep_ms
            .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return; // another thread swept
        }
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, e| e.created_at.elapsed() < self.ttl);
    }

    /// Atomic snapshot of the cache counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };
        CacheStats {
            size: self.entries.read().unwrap_or_else(|e| e.into_inner()).len(),
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            hit_rate,
            ttl: self.ttl,
        }
    }

    /// Lists the cached patterns with age and usage details.
    #[must_use]
    pub fn cached_patterns(&self) -> Vec<CachedPatternInfo> {
        let now = self.now_ms();
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .values()
            .map(|e| CachedPatternInfo {
                pattern: e.pattern.clone(),
                case_insensitive: e.case_insensitive,
                age: e.created_at.elapsed(),
                idle: Duration::from_millis(
                    now.saturating_sub(e.last_used_ms.load(Ordering::Relaxed)),
                ),
                use_count: e.use_count.load(Ordering::Relaxed),
            })
            .collect()
    }

    /// Removes every entry. Counters are preserved.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Default for RegexCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RegexCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("RegexCache")
            .field("size", &stats.size)
            .field("capacity", &self.capacity)
            .field("hits", &stats.hits)
            .field("misses", &stats.misses)
            .finish()
    }
}
