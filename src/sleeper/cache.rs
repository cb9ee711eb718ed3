// Time-to-live bound, read-through cache for slow-changing provider data.
//
// The player directory is a multi-megabyte download and market values move
// at most daily; both are held for a configured TTL per process. The clock
// is injectable so expiry is testable without sleeping.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of "now" for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real clock used outside tests.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Entry<V> {
    stored_at: Instant,
    value: Arc<V>,
}

/// A mutex-guarded map of values that expire `ttl` after insertion.
///
/// Callers drive the read-through pattern themselves: `get` on a hit,
/// fetch-then-`insert` on a miss. Values are handed out as `Arc`s so large
/// payloads are never cloned.
pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a fresh value. Expired entries are evicted and report a miss.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let expired = match entries.get(key) {
            Some(entry) => now.duration_since(entry.stored_at) >= self.ttl,
            None => return None,
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| Arc::clone(&entry.value))
    }

    /// Store a freshly fetched value, replacing any prior entry, and return
    /// it as the shared handle callers keep using.
    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key,
            Entry {
                stored_at: self.clock.now(),
                value: Arc::clone(&value),
            },
        );
        value
    }
}
