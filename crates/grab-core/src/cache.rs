//! In-memory result cache with a fixed time-to-live.
//!
//! A single mutex guards both lookup and store. Concurrent misses on the same
//! key are not coalesced: each caller fetches and the last store wins.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::clock::{Clock, SystemClock};

/// How long a resolution stays valid, in seconds.
pub const CACHE_TTL_SECS: i64 = 60 * 60;

/// [`CACHE_TTL_SECS`] as a duration.
pub fn default_ttl() -> Duration {
    Duration::seconds(CACHE_TTL_SECS)
}

struct CachedEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Thread-safe key/value store whose entries expire `ttl` after being stored.
///
/// Expired entries are dropped when they are looked up and are otherwise
/// only replaced by the next store of the same key. Without a capacity the
/// map grows with the number of distinct keys; [`TtlCache::with_capacity`]
/// bounds it by evicting the oldest entry.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CachedEntry<V>>>,
    ttl: Duration,
    capacity: Option<usize>,
    clock: Arc<dyn Clock>,
}

impl<K, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Display,
    V: Clone,
{
    /// Unbounded cache on the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: None,
            clock,
        }
    }

    /// Bound the number of live entries. A capacity of zero disables storing.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, CachedEntry<V>>> {
        // The map holds no invariants a panicking writer could break.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &CachedEntry<V>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.stored_at) >= self.ttl
    }

    /// Return the live value for `key`, if any.
    pub fn lookup(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => self.is_expired(entry, now),
        };
        if expired {
            debug!(%key, "cache entry expired");
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|e| e.value.clone())
    }

    /// Insert or overwrite `key`, stamped with the current time.
    pub fn store(&self, key: K, value: V) {
        let now = self.clock.now();
        let mut entries = self.lock();

        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            if !entries.contains_key(&key) && entries.len() >= capacity {
                entries.retain(|_, e| now.signed_duration_since(e.stored_at) < self.ttl);
                if entries.len() >= capacity {
                    let oldest = entries
                        .iter()
                        .min_by_key(|(_, e)| e.stored_at)
                        .map(|(k, _)| k.clone());
                    if let Some(oldest) = oldest {
                        debug!(key = %oldest, "evicting oldest cache entry");
                        entries.remove(&oldest);
                    }
                }
            }
        }

        entries.insert(
            key,
            CachedEntry {
                value,
                stored_at: now,
            },
        );
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| now.signed_duration_since(e.stored_at) < self.ttl);
        before - entries.len()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
