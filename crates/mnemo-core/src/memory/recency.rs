//! Recency buffer: the short-term memory tier.
//!
//! A capacity-bounded, insertion-ordered buffer of the most recent records
//! across the whole process. The bound is global, not per session: a busy
//! session can push another session's history out of the buffer. Callers
//! that need a complete history must go to the durable store.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::RwLock;

use mnemo_types::memory::MemoryRecord;

/// Default capacity, shared by all sessions.
pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded FIFO of recent interaction records.
///
/// Appends evict the oldest record once `capacity` is reached. Reads return
/// cloned snapshots, so no lock is held after a method returns.
#[derive(Debug)]
pub struct RecencyBuffer {
    records: RwLock<VecDeque<MemoryRecord>>,
    capacity: NonZeroUsize,
}

impl RecencyBuffer {
    /// Create an empty buffer holding at most `capacity` records.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            records: RwLock::new(VecDeque::with_capacity(capacity.get().min(1024))),
            capacity,
        }
    }

    /// Append a record, evicting the oldest one when the buffer is full.
    pub fn add(&self, record: MemoryRecord) {
        let mut records = self.records.write().expect("recency buffer lock poisoned");
        if records.len() >= self.capacity.get() {
            if let Some(evicted) = records.pop_front() {
                tracing::trace!(
                    record_id = %evicted.id,
                    session_id = %evicted.session_id,
                    "evicted record from recency buffer"
                );
            }
        }
        records.push_back(record);
    }

    /// The last `min(limit, len)` records, oldest first.
    pub fn get_recent(&self, limit: usize) -> Vec<MemoryRecord> {
        let records = self.records.read().expect("recency buffer lock poisoned");
        let skip = records.len().saturating_sub(limit);
        records.iter().skip(skip).cloned().collect()
    }

    /// All buffered records of one session, in insertion order.
    ///
    /// Best-effort: records evicted by capacity pressure are not returned.
    pub fn get_by_session(&self, session_id: &str) -> Vec<MemoryRecord> {
        let records = self.records.read().expect("recency buffer lock poisoned");
        records
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect()
    }

    /// Remove every buffered record.
    pub fn clear(&self) {
        self.records.write().expect("recency buffer lock poisoned").clear();
    }

    /// Number of buffered records.
    pub fn len(&self) -> usize {
        self.records.read().expect("recency buffer lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

impl Default for RecencyBuffer {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CAPACITY).expect("default capacity is non-zero"))
    }
}
