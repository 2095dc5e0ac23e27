use std::collections::VecDeque;

use scbi_frame::ParameterRecord;
use tracing::warn;

use crate::error::{BridgeError, Result};

/// Default bound on queued records.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// FIFO of decoded records awaiting delivery.
///
/// Single-threaded by construction: the dispatch loop owns it exclusively.
#[derive(Debug)]
pub struct ParameterQueue {
    records: VecDeque<ParameterRecord>,
    capacity: usize,
    dropped: u64,
}

impl ParameterQueue {
    /// Create a queue holding at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity.min(DEFAULT_QUEUE_CAPACITY)),
            capacity,
            dropped: 0,
        }
    }

    /// Append a record. At capacity the new record is dropped.
    pub fn push(&mut self, record: ParameterRecord) -> Result<()> {
        if self.records.len() >= self.capacity {
            self.dropped = self.dropped.saturating_add(1);
            warn!(
                capacity = self.capacity,
                dropped = self.dropped,
                %record,
                "parameter queue full, dropping record"
            );
            return Err(BridgeError::QueueFull {
                capacity: self.capacity,
            });
        }
        self.records.push_back(record);
        Ok(())
    }

    /// Remove the oldest record; `None` when empty.
    pub fn pop(&mut self) -> Option<ParameterRecord> {
        self.records.pop_front()
    }

    /// Pop records oldest-first until the queue is empty.
    pub fn drain(&mut self) -> impl Iterator<Item = ParameterRecord> + '_ {
        std::iter::from_fn(move || self.pop())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for ParameterQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use scbi_frame::ParameterKind;

    use super::*;

    fn record(name: &str, value: i64) -> ParameterRecord {
        ParameterRecord::new(ParameterKind::Sensor, name, value)
    }

    #[test]
    fn fifo_order_then_empty() {
        let mut queue = ParameterQueue::default();
        queue.push(record("a", 1)).unwrap();
        queue.push(record("b", 2)).unwrap();
        queue.push(record("c", 3)).unwrap();

        assert_eq!(queue.pop().unwrap().name, "a");
        assert_eq!(queue.pop().unwrap().name, "b");
        assert_eq!(queue.pop().unwrap().name, "c");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn drops_beyond_capacity() {
        let mut queue = ParameterQueue::new(2);
        queue.push(record("a", 1)).unwrap();
        queue.push(record("b", 2)).unwrap();

        let err = queue.push(record("c", 3)).unwrap_err();
        assert!(matches!(err, BridgeError::QueueFull { capacity: 2 }));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped(), 1);

        // The oldest records survive.
        let names: Vec<_> = queue.drain().map(|r| r.name).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn drain_empties_queue() {
        let mut queue = ParameterQueue::default();
        for i in 0..5 {
            queue.push(record("x", i)).unwrap();
        }
        let values: Vec<_> = queue.drain().map(|r| r.value).collect();
        assert_eq!(values, [0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut queue = ParameterQueue::new(0);
        assert_eq!(queue.capacity(), 1);
        assert!(queue.push(record("a", 1)).is_ok());
        assert!(queue.push(record("b", 2)).is_err());
    }
}
