//! Keyed cache with a fixed time-to-live
//!
//! Entries expire lazily: a stale entry is only removed when it is read or
//! when a write sweeps the map. There is no background eviction. One mutex
//! guards the whole map so check-then-write sequences cannot lose updates.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::ports::Clock;

/// A cached value with its write time
#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Thread-safe TTL cache with an injected clock
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.lock().len())
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// The configured time-to-live
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stale once `now >= stored_at + ttl`
    fn is_fresh(&self, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now < stored_at + self.ttl
    }

    /// Read a fresh value, evicting it if it has expired
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_with_age(key).map(|(value, _)| value)
    }

    /// Read a fresh value together with its write time
    pub fn get_with_age(&self, key: &K) -> Option<(V, DateTime<Utc>)> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        match entries.get(key) {
            Some(entry) if self.is_fresh(entry.stored_at, now) => {
                Some((entry.value.clone(), entry.stored_at))
            },
            Some(_) => {
                entries.remove(key);
                None
            },
            None => None,
        }
    }

    /// Store a value, replacing any previous one
    pub fn insert(&self, key: K, value: V) {
        let stored_at = self.clock.now();
        self.entries.lock().insert(key, Entry { value, stored_at });
    }

    /// Read-modify-write under a single lock acquisition
    ///
    /// `f` receives the previous value if it is still fresh and returns the
    /// value to store plus a result for the caller. Expired entries of every
    /// key are dropped in the same critical section.
    pub fn update<R, F>(&self, key: K, f: F) -> R
    where
        F: FnOnce(Option<&V>) -> (V, R),
    {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        entries.retain(|_, entry| now < entry.stored_at + self.ttl);

        let (value, result) = f(entries.get(&key).map(|e| &e.value));
        entries.insert(
            key,
            Entry {
                value,
                stored_at: now,
            },
        );
        result
    }

    /// Drop every expired entry, returning how many were removed
    pub fn prune_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.stored_at + self.ttl);
        before - entries.len()
    }

    /// Number of entries, including ones that expired but were not yet evicted
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
