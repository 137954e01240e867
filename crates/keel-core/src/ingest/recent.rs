use std::{
    collections::{HashSet, VecDeque},
    hash::Hash,
};

/// Recently seen block numbers kept for duplicate suppression.
pub const RECENT_BLOCKS_CAP: usize = 100;
/// Recently seen transaction hashes kept for duplicate suppression.
pub const RECENT_TRANSACTIONS_CAP: usize = 2000;

/// Bounded set with FIFO eviction.
///
/// Only used to suppress duplicate notifications; ordering correctness never
/// depends on it.
#[derive(Debug)]
pub struct RecencySet<T> {
    order: VecDeque<T>,
    members: HashSet<T>,
    capacity: usize,
}

impl<T: Eq + Hash + Clone> RecencySet<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Records `item`. Returns `false` if it was already present.
    pub fn insert(&mut self, item: T) -> bool {
        if self.capacity == 0 || self.members.contains(&item) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.members.insert(item.clone());
        self.order.push_back(item);
        true
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}
