//! A fixed-size cache of upper bounds on negamax scores

use crate::engine::{MAX_SCORE, MIN_SCORE};

#[derive(Copy, Clone)]
struct Entry {
    key: u64,
    horizon: u8,
    value: u8,
}
impl Entry {
    pub fn new() -> Self {
        Self {
            key: 0,
            horizon: 0,
            value: 0,
        }
    }
}

/// The default number of entries, a prime just above 2^20
pub const DEFAULT_CAPACITY: usize = (1 << 20) + 7;

/// Maps position keys to an upper bound on their score
///
/// Each key has exactly one slot, and storing into an occupied slot replaces
/// whatever was there, so memory use never grows past the capacity chosen
/// at construction. Bounds are tagged with the search horizon they were
/// computed under and only answer lookups made under that same horizon.
#[derive(Clone)]
pub struct TranspositionTable {
    entries: Vec<Entry>,
}

impl TranspositionTable {
    /// Creates a table with `capacity` slots; a capacity of 0 caches nothing
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![Entry::new(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Stores an upper bound for a position
    pub fn set(&mut self, key: u64, horizon: usize, bound: i32) {
        let len = self.entries.len();
        if len == 0 || !(MIN_SCORE..=MAX_SCORE).contains(&bound) {
            return;
        }
        // offset of one to prevent putting a 0, which represents an empty entry
        self.entries[key as usize % len] = Entry {
            key,
            horizon: horizon as u8,
            value: (bound - MIN_SCORE + 1) as u8,
        };
    }

    /// Fetches the upper bound stored for a position, if there is a usable one
    pub fn get(&self, key: u64, horizon: usize) -> Option<i32> {
        let len = self.entries.len();
        if len == 0 {
            return None;
        }
        let entry = self.entries[key as usize % len];
        if entry.value == 0 || entry.key != key || entry.horizon as usize != horizon {
            return None;
        }
        let bound = entry.value as i32 + MIN_SCORE - 1;
        // anything out of range can only come from a corrupt slot
        if bound > MAX_SCORE {
            return None;
        }
        Some(bound)
    }

    /// Forgets every stored bound
    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = Entry::new();
        }
    }

    /// The number of occupied slots
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.value != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
