//! In-memory stores: a plain ordered map and a staged-write cache over a
//! parent store.

use crate::ports::KvStore;
use std::collections::BTreeMap;

/// `BTreeMap`-backed store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.entries.insert(key.to_vec(), value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Staged writes over a parent store.
///
/// Reads see staged writes first. Nothing reaches the parent until
/// [`CacheStore::commit`]; dropping the cache discards every staged write.
pub struct CacheStore<'a> {
    parent: &'a mut dyn KvStore,
    /// `None` marks a staged delete.
    staged: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> CacheStore<'a> {
    /// Empty cache over `parent`.
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        Self {
            parent,
            staged: BTreeMap::new(),
        }
    }

    /// Number of staged writes and deletes.
    pub fn pending(&self) -> usize {
        self.staged.len()
    }

    /// Flush staged writes to the parent in key order.
    pub fn commit(self) {
        for (key, value) in self.staged {
            match value {
                Some(value) => self.parent.set(&key, value),
                None => self.parent.delete(&key),
            }
        }
    }
}

impl KvStore for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.staged.get(key) {
            Some(staged) => staged.clone(),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.staged.insert(key.to_vec(), Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.staged.insert(key.to_vec(), None);
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.prefix_scan(prefix).into_iter().collect();

        for (key, value) in self
            .staged
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_scan_is_ordered_and_bounded() {
        let mut store = MemoryStore::new();
        store.set(&[1, 2], vec![2]);
        store.set(&[1, 1], vec![1]);
        store.set(&[2, 0], vec![3]);

        let scanned = store.prefix_scan(&[1]);
        assert_eq!(scanned, vec![(vec![1, 1], vec![1]), (vec![1, 2], vec![2])]);
    }

    #[test]
    fn test_cache_reads_through_and_commits() {
        let mut store = MemoryStore::new();
        store.set(b"a", b"1".to_vec());
        store.set(b"b", b"2".to_vec());

        let mut cache = CacheStore::new(&mut store);
        assert_eq!(cache.get(b"a"), Some(b"1".to_vec()));
        cache.set(b"a", b"10".to_vec());
        cache.delete(b"b");
        cache.set(b"c", b"3".to_vec());
        assert_eq!(cache.get(b"a"), Some(b"10".to_vec()));
        assert!(!cache.has(b"b"));
        assert_eq!(cache.pending(), 3);
        cache.commit();

        assert_eq!(store.get(b"a"), Some(b"10".to_vec()));
        assert_eq!(store.get(b"b"), None);
        assert_eq!(store.get(b"c"), Some(b"3".to_vec()));
    }

    #[test]
    fn test_dropped_cache_discards_writes() {
        let mut store = MemoryStore::new();
        store.set(b"a", b"1".to_vec());
        {
            let mut cache = CacheStore::new(&mut store);
            cache.set(b"a", b"2".to_vec());
            cache.set(b"z", b"9".to_vec());
        }
        assert_eq!(store.get(b"a"), Some(b"1".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_cache_prefix_scan_merges_staged() {
        let mut store = MemoryStore::new();
        store.set(&[7, 1], vec![1]);
        store.set(&[7, 3], vec![3]);

        let mut cache = CacheStore::new(&mut store);
        cache.set(&[7, 2], vec![2]);
        cache.delete(&[7, 3]);
        cache.set(&[8, 0], vec![0]);

        let keys: Vec<_> = cache.prefix_scan(&[7]).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![vec![7, 1], vec![7, 2]]);
    }

    #[test]
    fn test_nested_caches() {
        let mut store = MemoryStore::new();
        {
            let mut outer = CacheStore::new(&mut store);
            outer.set(b"x", b"1".to_vec());
            {
                let mut inner = CacheStore::new(&mut outer);
                inner.set(b"y", b"2".to_vec());
                assert_eq!(inner.get(b"x"), Some(b"1".to_vec()));
            }
            assert!(!outer.has(b"y"));
            outer.commit();
        }
        assert!(store.has(b"x"));
        assert!(!store.has(b"y"));
    }
}
