//! Bounded cache with two-bucket eviction: an active map of up to
//! `cap` entries and a cold map holding the previous generation. When
//! the active map fills, it is demoted wholesale and a fresh one
//! started, giving amortized O(1) eviction without per-entry recency
//! tracking.

use std::collections::HashMap;
use std::hash::Hash;

pub struct Lru<K, V> {
    cap: usize,
    active: HashMap<K, V>,
    cold: HashMap<K, V>,
}

impl<K: Eq + Hash, V> Lru<K, V> {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            active: HashMap::new(),
            cold: HashMap::new(),
        }
    }

    /// Look up an entry, promoting a cold hit back into the active
    /// generation.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if !self.active.contains_key(key) {
            let (k, v) = self.cold.remove_entry(key)?;
            self.rotate();
            self.active.insert(k, v);
        }
        self.active.get(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.cold.remove(&key);
        if !self.active.contains_key(&key) {
            self.rotate();
        }
        self.active.insert(key, value);
    }

    pub fn remove(&mut self, key: &K) {
        self.active.remove(key);
        self.cold.remove(key);
    }

    fn rotate(&mut self) {
        if self.active.len() >= self.cap {
            self.cold = std::mem::take(&mut self.active);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bounded_eviction() {
        let mut lru = Lru::new(2);
        lru.insert("a", 1);
        lru.insert("b", 2);
        // "a" and "b" demote to the cold generation
        lru.insert("c", 3);
        assert_eq!(lru.get(&"a"), Some(&1));
        lru.insert("d", 4);
        lru.insert("e", 5);
        // two generations have passed since "b" was touched
        assert_eq!(lru.get(&"b"), None);
        assert_eq!(lru.get(&"e"), Some(&5));
    }

    #[test]
    fn insert_replaces() {
        let mut lru = Lru::new(2);
        lru.insert("a", 1);
        lru.insert("a", 2);
        assert_eq!(lru.get(&"a"), Some(&2));
    }
}
