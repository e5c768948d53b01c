//! Pending-delivery buffer with capacity and interval flush triggers.
//!
//! The buffer performs no I/O and starts no timers. It only answers whether a
//! flush is due; the owning [`Logger`](crate::Logger) captures the batch and
//! hands it to a transport.
//!
//! Delivery is at-most-once: a captured batch is never put back, so a batch
//! whose send fails is lost. This keeps memory bounded when the collector is
//! unreachable.

use crate::entry::LogEntry;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct LogBuffer {
    entries: Vec<LogEntry>,
    max_size: usize,
    flush_interval: Duration,
    last_flush_at: Instant,
}

impl LogBuffer {
    /// `max_size` and `flush_interval` are clamped to at least 1
    pub fn new(max_size: usize, flush_interval: Duration, now: Instant) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: Vec::with_capacity(max_size),
            max_size,
            flush_interval: flush_interval.max(Duration::from_millis(1)),
            last_flush_at: now,
        }
    }

    pub fn add(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Capacity reached or the flush interval has elapsed
    pub fn should_flush(&self, now: Instant) -> bool {
        self.entries.len() >= self.max_size
            || now.saturating_duration_since(self.last_flush_at) >= self.flush_interval
    }

    /// Take every pending entry, leaving the buffer empty
    pub fn flush(&mut self, now: Instant) -> Vec<LogEntry> {
        self.last_flush_at = now;
        std::mem::replace(&mut self.entries, Vec::with_capacity(self.max_size))
    }

    /// Discard pending entries without delivering them
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    /// Apply new thresholds; pending entries are kept
    pub fn reconfigure(&mut self, max_size: usize, flush_interval: Duration) {
        self.max_size = max_size.max(1);
        self.flush_interval = flush_interval.max(Duration::from_millis(1));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    pub fn last_flush_at(&self) -> Instant {
        self.last_flush_at
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LogLevel;
    use proptest::prelude::*;

    fn entry(n: usize) -> LogEntry {
        LogEntry::new(LogLevel::Info, format!("entry-{n}"))
    }

    /// Add and flush synchronously whenever the buffer asks for it
    fn add_and_maybe_flush(buffer: &mut LogBuffer, e: LogEntry, now: Instant) -> Option<Vec<LogEntry>> {
        buffer.add(e);
        buffer.should_flush(now).then(|| buffer.flush(now))
    }

    #[test]
    fn test_capacity_triggers_flush() {
        let start = Instant::now();
        let mut buffer = LogBuffer::new(3, Duration::from_secs(60), start);
        let mut batches = Vec::new();

        for i in 0..4 {
            if let Some(batch) = add_and_maybe_flush(&mut buffer, entry(i), start) {
                batches.push(batch);
            }
        }

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_interval_triggers_flush() {
        let start = Instant::now();
        let mut buffer = LogBuffer::new(100, Duration::from_millis(500), start);
        buffer.add(entry(0));

        assert!(!buffer.should_flush(start + Duration::from_millis(499)));
        assert!(buffer.should_flush(start + Duration::from_millis(500)));

        let later = start + Duration::from_secs(1);
        let batch = buffer.flush(later);
        assert_eq!(batch.len(), 1);
        assert_eq!(buffer.last_flush_at(), later);
        assert!(!buffer.should_flush(later));
    }

    #[test]
    fn test_flush_preserves_order_and_resets() {
        let start = Instant::now();
        let mut buffer = LogBuffer::new(10, Duration::from_secs(60), start);
        for i in 0..5 {
            buffer.add(entry(i));
        }

        let batch = buffer.flush(start);
        let messages: Vec<_> = batch.iter().map(|e| e.message().to_string()).collect();
        assert_eq!(messages, ["entry-0", "entry-1", "entry-2", "entry-3", "entry-4"]);
        assert!(buffer.is_empty());

        buffer.add(entry(5));
        assert_eq!(buffer.snapshot()[0].message(), "entry-5");
    }

    #[test]
    fn test_clear_discards_pending() {
        let start = Instant::now();
        let mut buffer = LogBuffer::new(10, Duration::from_secs(60), start);
        buffer.add(entry(0));
        buffer.add(entry(1));

        assert_eq!(buffer.clear(), 2);
        assert!(buffer.is_empty());
        assert_eq!(buffer.last_flush_at(), start);
    }

    #[test]
    fn test_zero_thresholds_are_clamped() {
        let buffer = LogBuffer::new(0, Duration::ZERO, Instant::now());
        assert_eq!(buffer.max_size(), 1);
        assert_eq!(buffer.flush_interval(), Duration::from_millis(1));
    }

    proptest! {
        #[test]
        fn test_capacity_never_exceeded_and_handoff_is_lossless(
            max_size in 1usize..8,
            count in 0usize..64,
        ) {
            let start = Instant::now();
            let mut buffer = LogBuffer::new(max_size, Duration::from_secs(3600), start);
            let mut delivered = Vec::new();

            for i in 0..count {
                if let Some(batch) = add_and_maybe_flush(&mut buffer, entry(i), start) {
                    delivered.extend(batch);
                }
                prop_assert!(buffer.len() < max_size);
            }
            delivered.extend(buffer.flush(start));

            let messages: Vec<_> = delivered.iter().map(|e| e.message().to_string()).collect();
            let expected: Vec<_> = (0..count).map(|i| format!("entry-{i}")).collect();
            prop_assert_eq!(messages, expected);
        }
    }
}
