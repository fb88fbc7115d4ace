//! Bounded caches for lazily derived values.

use std::fmt;
use std::hash::Hash;

use hashlink::LruCache;

/// Capacity used for derived-layer and label caches.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// LRU cache that creates missing values on demand.
///
/// Once `capacity` entries are held, inserting evicts the least recently used
/// entry.
pub struct BoundedCache<K: Hash + Eq, V> {
    name: &'static str,
    entries: LruCache<K, V>,
}

impl<K: Hash + Eq, V> BoundedCache<K, V> {
    /// Create a cache. A capacity of 0 is treated as 1.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            entries: LruCache::new(capacity.max(1)),
        }
    }

    /// Name used in log output.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Return the cached value or store the one built by `create`.
    pub fn get_or_create(&mut self, key: K, create: impl FnOnce(&K) -> V) -> V
    where
        V: Clone,
    {
        if let Some(value) = self.entries.get(&key) {
            return value.clone();
        }
        let value = create(&key);
        if self.entries.len() >= self.entries.capacity() {
            tracing::trace!(target: "meistercharts::cache", cache = self.name, "evicting least recently used entry");
        }
        self.entries.insert(key, value.clone());
        value
    }

    /// Look up a value and mark it as recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Visit every cached entry.
    pub fn for_each(&self, mut visit: impl FnMut(&K, &V)) {
        for (key, value) in self.entries.iter() {
            visit(key, value);
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Hash + Eq, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("name", &self.name)
            .field("len", &self.entries.len())
            .finish()
    }
}
