//! Bounded in-memory cache of recent search result bundles.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::protocol::ResultBundle;

/// Normalizes a raw query into its cache-key form. Keys are trimmed and
/// lowercased so `"Adele"` and `"adele"` share one entry.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

struct CacheEntry {
    bundle: ResultBundle,
    stored_at: Instant,
}

/// Query-result cache with lazy TTL expiry and strict FIFO eviction.
///
/// Entries expire by age at read time; nothing sweeps them proactively.
/// Once the map grows past its capacity the oldest-inserted key is evicted,
/// regardless of how recently it was read. Overwriting a live key refreshes
/// its timestamp but keeps its original insertion-order position.
pub struct ResultCache {
    entries: HashMap<String, CacheEntry>,
    insertion_order: VecDeque<String>,
    ttl: Duration,
    capacity: usize,
}

impl ResultCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Applies updated tuning, evicting down to the new capacity if needed.
    pub fn reconfigure(&mut self, ttl: Duration, capacity: usize) {
        self.ttl = ttl;
        self.capacity = capacity.max(1);
        self.evict_over_capacity();
    }

    pub fn get(&self, key: &str) -> Option<&ResultBundle> {
        self.get_at(key, Instant::now())
    }

    pub fn set(&mut self, key: String, bundle: ResultBundle) {
        self.set_at(key, bundle, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<&ResultBundle> {
        let entry = self.entries.get(key)?;
        if now.duration_since(entry.stored_at) < self.ttl {
            Some(&entry.bundle)
        } else {
            None
        }
    }

    fn set_at(&mut self, key: String, bundle: ResultBundle, now: Instant) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.bundle = bundle;
            entry.stored_at = now;
            return;
        }
        self.entries.insert(
            key.clone(),
            CacheEntry {
                bundle,
                stored_at: now,
            },
        );
        self.insertion_order.push_back(key);
        self.evict_over_capacity();
    }

    fn evict_over_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            let Some(oldest_key) = self.insertion_order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest_key);
        }
    }
}
