// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::hash::Hash;

use hashbrown::{Equivalent, HashMap};

/// An entry in the cache.
struct Entry<T> {
    epoch: u64,
    data: T,
}

/// A least-recently-used cache with a hashed index.
///
/// Lookups are O(1); eviction scans for the oldest entry and only runs once
/// the cache is at capacity.
pub(crate) struct LruCache<K, T> {
    entries: HashMap<K, Entry<T>>,
    epoch: u64,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, T> LruCache<K, T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            epoch: 0,
            capacity: capacity.max(1),
        }
    }

    /// Returns a reference to the entry with the given key. If the entry is
    /// not present, it is created with `make_data`.
    ///
    /// The lookup key must be `Equivalent` to `K` for lookups and
    /// convertible `Into<K>` for creating new entries, so callers can probe
    /// with borrowed data.
    pub(crate) fn entry<Q>(&mut self, key: Q, make_data: impl FnOnce() -> T) -> &T
    where
        Q: Hash + Equivalent<K> + Into<K>,
    {
        self.epoch += 1;
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_oldest();
        }
        let epoch = self.epoch;
        let entry = self
            .entries
            .entry(key.into())
            .or_insert_with(|| Entry {
                epoch,
                data: make_data(),
            });
        entry.epoch = epoch;
        &entry.data
    }

    /// Returns the cached entry for the key, refreshing its age, without
    /// creating one.
    pub(crate) fn get<Q>(&mut self, key: &Q) -> Option<&T>
    where
        Q: Hash + Equivalent<K>,
    {
        self.epoch += 1;
        let epoch = self.epoch;
        self.entries.get_mut(key).map(|entry| {
            entry.epoch = epoch;
            &entry.data
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.epoch)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    struct TestKey(String);
    struct TestLookupKey<'a>(&'a str);

    impl Hash for TestLookupKey<'_> {
        fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
            // Must match TestKey's derived hash (String hashes as str).
            self.0.hash(state);
        }
    }

    impl Equivalent<TestKey> for TestLookupKey<'_> {
        fn equivalent(&self, key: &TestKey) -> bool {
            self.0 == key.0.as_str()
        }
    }

    impl From<TestLookupKey<'_>> for TestKey {
        fn from(key: TestLookupKey<'_>) -> Self {
            Self(key.0.to_owned())
        }
    }

    #[test]
    fn retrieve_existing_entry() {
        let mut cache = LruCache::new(3);

        let value1 = cache.entry(TestLookupKey("key1"), || 42);
        assert_eq!(*value1, 42);

        // Retrieve the same entry - make_data should not be called.
        let value2 = cache.entry(TestLookupKey("key1"), || {
            panic!("should not create new data")
        });
        assert_eq!(*value2, 42);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn lru_eviction() {
        let mut cache = LruCache::new(3);

        cache.entry(TestLookupKey("key1"), || 1);
        cache.entry(TestLookupKey("key2"), || 2);
        cache.entry(TestLookupKey("key3"), || 3);

        // Touch key1 so key2 becomes the oldest.
        cache.entry(TestLookupKey("key1"), || panic!("should not create"));

        cache.entry(TestLookupKey("key4"), || 4);

        let value1 = cache.entry(TestLookupKey("key1"), || {
            panic!("key1 should still be present")
        });
        assert_eq!(*value1, 1);

        let mut was_created = false;
        cache.entry(TestLookupKey("key2"), || {
            was_created = true;
            20
        });
        assert!(was_created, "key2 should have been evicted");
    }

    #[test]
    fn capacity_is_bounded() {
        let mut cache = LruCache::new(2);
        for i in 0..10 {
            cache.entry(TestLookupKey(&format!("key{i}")), || i);
        }
        assert_eq!(cache.len(), 2);
    }
}
