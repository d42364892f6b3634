//! Result cache - process-local memoization of traversal outputs
//!
//! Keys are `operation:params` strings built from canonical JSON, so two
//! calls with equal parameters always hit the same entry. Entries expire
//! after a TTL and the whole cache is purged on any committed mutation,
//! since one mutation can change the answer to many different queries.
//!
//! The cache is an injected abstraction: the engine takes any
//! [`QueryCache`], tests substitute counting stubs, production uses
//! [`LruQueryCache`] with an optional [`CacheSweeper`].

use crate::Result;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Default entry time-to-live
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default maximum entry count
pub const DEFAULT_CAPACITY: usize = 256;

/// Build a stable cache key from an operation name and its parameters.
/// serde_json maps serialize with sorted keys, so equal parameters always
/// produce the same key.
pub fn cache_key(operation: &str, params: &impl Serialize) -> Result<String> {
    Ok(format!("{}:{}", operation, serde_json::to_string(params)?))
}

/// Shared-state cache for graph query results.
///
/// Implementations must be safe under concurrent access; all entries
/// belong to one invalidation domain, purged together on mutation.
pub trait QueryCache: Send + Sync {
    /// Look up a live entry
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a computed result
    fn put(&self, key: &str, value: Value);

    /// Drop every entry. Called after any committed mutation.
    fn invalidate_all(&self);

    /// Drop entries past their TTL regardless of access
    fn purge_expired(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

/// TTL-bounded LRU cache.
///
/// Capacity overflow evicts the least recently used entry. Expired
/// entries are dropped lazily on access and eagerly by `purge_expired`.
pub struct LruQueryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl LruQueryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

impl QueryCache for LruQueryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) => {
                if entry.stored_at.elapsed() < self.ttl {
                    return Some(entry.value.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        None
    }

    fn put(&self, key: &str, value: Value) {
        let mut entries = self.entries.lock();
        entries.put(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    fn invalidate_all(&self) {
        self.entries.lock().clear();
    }

    fn purge_expired(&self) {
        let mut entries = self.entries.lock();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.stored_at.elapsed() >= self.ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            entries.pop(&key);
        }
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Periodic background sweep removing TTL-expired entries nobody reads
/// again. Explicitly constructed and torn down; dropping the handle stops
/// and joins the thread.
pub struct CacheSweeper {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CacheSweeper {
    pub fn start(cache: Arc<dyn QueryCache>, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            // short ticks keep shutdown prompt without busy-waiting
            let tick = Duration::from_millis(100).min(interval);
            let mut waited = Duration::ZERO;
            while !flag.load(Ordering::Relaxed) {
                std::thread::sleep(tick);
                waited += tick;
                if waited >= interval {
                    cache.purge_expired();
                    waited = Duration::ZERO;
                }
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stop the sweep thread and wait for it to exit
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
