//! Fixed-capacity append log used for recent activity and search history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Append-only ring buffer that evicts its oldest entry once full.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundedLog<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T> BoundedLog<T> {
    /// Create a log holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append an entry, evicting the oldest one if the log is full.
    pub fn push(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries from newest to oldest.
    pub fn newest_first(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().rev()
    }

    /// Entries from oldest to newest.
    pub fn oldest_first(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest() {
        let mut log = BoundedLog::new(3);
        for i in 0..5 {
            log.push(i);
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.oldest_first().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(log.newest_first().copied().collect::<Vec<_>>(), vec![4, 3, 2]);
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut log = BoundedLog::new(0);
        log.push("x");
        assert!(log.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut log = BoundedLog::new(2);
        log.push(1);
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.capacity(), 2);
    }
}
