// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! Bounded memoization cache shared by the abstraction engine. Entries carry
//! an access stamp and the oldest half is dropped in one batch once the
//! capacity is exceeded.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

pub struct MemoCache<K, V> {
    entries: HashMap<K, (V, u64)>,
    capacity: usize,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl<K: Eq + Hash + Clone, V: Eq + Clone + Debug> MemoCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2);
        Self {
            entries: HashMap::with_capacity(capacity),
            capacity,
            clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        self.clock += 1;
        match self.entries.get_mut(key) {
            Some((value, stamp)) => {
                *stamp = self.clock;
                self.hits += 1;
                Some(value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Caches `value` under `key`. A different value under the same key
    /// indicates a broken canonical identity and fails loudly.
    pub fn insert(&mut self, key: K, value: V) {
        self.clock += 1;
        if let Some((old, stamp)) = self.entries.get_mut(&key) {
            assert_eq!(*old, value, "conflicting cache entries for the same key");
            *stamp = self.clock;
            return;
        }
        if self.entries.len() >= self.capacity {
            self.evict_oldest_half();
        }
        self.entries.insert(key, (value, self.clock));
    }

    fn evict_oldest_half(&mut self) {
        let mut stamps: Vec<u64> = self.entries.values().map(|(_, s)| *s).collect();
        stamps.sort_unstable();
        let cutoff = stamps[stamps.len() / 2];
        self.entries.retain(|_, (_, stamp)| *stamp >= cutoff);
        log::debug!(
            "cache eviction: {} entries remain of {} capacity",
            self.entries.len(),
            self.capacity
        );
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
