//! An insertion-ordered map that also supports lookup by position
//!
//! Used wherever the codec needs append-only, order-preserving tables with
//! dedup-by-value lookups: the name map, the import-dedup table, and the
//! imported-package/public-export-hash slot tables.

use std::borrow::Borrow;
use std::hash::Hash;

use rustc_hash::FxHashMap;

/// An ordered map from `K` to `V` that preserves insertion order and allows
/// lookup both by key and by insertion index.
#[derive(Debug, Clone)]
pub struct IndexedMap<K, V> {
    entries: Vec<(K, V)>,
    key_to_index: FxHashMap<K, usize>,
}

impl<K: Eq + Hash + PartialEq, V: PartialEq> PartialEq for IndexedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Eq + Hash, V: Eq> Eq for IndexedMap<K, V> {}

impl<K, V> Default for IndexedMap<K, V> {
    fn default() -> Self {
        IndexedMap {
            entries: Vec::new(),
            key_to_index: FxHashMap::default(),
        }
    }
}

impl<K, V> IndexedMap<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a new, empty `IndexedMap`
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new `IndexedMap` with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        IndexedMap {
            entries: Vec::with_capacity(capacity),
            key_to_index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Insert a key/value pair, appending it at the end if the key is new or
    /// overwriting the value in place if it already exists.
    ///
    /// Returns the index the entry occupies.
    pub fn insert(&mut self, key: K, value: V) -> usize {
        if let Some(&index) = self.key_to_index.get(&key) {
            self.entries[index].1 = value;
            index
        } else {
            let index = self.entries.len();
            self.key_to_index.insert(key.clone(), index);
            self.entries.push((key, value));
            index
        }
    }

    /// Get a value by key
    pub fn get_by_key<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.key_to_index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Get a value by insertion index
    pub fn get_by_index(&self, index: usize) -> Option<&V> {
        self.entries.get(index).map(|(_, v)| v)
    }

    /// Get the index a key was inserted at
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.key_to_index.get(key).copied()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a key is present
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.key_to_index.contains_key(key)
    }

    /// Iterate over values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Iterate over keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Iterate over `(key, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &(K, V)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut map = IndexedMap::new();
        map.insert("b", 2);
        map.insert("a", 1);
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn reinserting_a_key_overwrites_in_place() {
        let mut map = IndexedMap::new();
        let first = map.insert("a", 1);
        let second = map.insert("a", 2);
        assert_eq!(first, second);
        assert_eq!(map.get_by_key("a"), Some(&2));
        assert_eq!(map.len(), 1);
    }
}
