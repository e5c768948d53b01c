//! Bounded in-memory history of recent entries.
//!
//! Unlike the delivery buffer, history is never flushed: it keeps the most
//! recent entries for analysis and support-bundle export, evicting the oldest
//! entry once capacity is reached.

use crate::entry::LogEntry;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct LogHistory {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl LogHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Shrinking evicts the oldest entries
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
