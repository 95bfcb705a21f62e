//! DurableStore trait definition.
//!
//! The long-term tier: authoritative, unbounded storage keyed by record id,
//! with optional encryption of sensitive content, similarity search, and
//! age-based retention. Implementations live in mnemo-infra.

use chrono::{DateTime, Duration, Utc};

use mnemo_types::error::MemoryError;
use mnemo_types::memory::{MemoryRecord, ScoredRecord};

/// Port for the long-term memory tier.
///
/// All methods are synchronous and safe to call from many threads at once.
/// Implementations hold one canonical copy per id and never hand out a
/// reference to it: every read returns a fresh, decrypted view.
pub trait DurableStore: Send + Sync {
    /// Insert or overwrite the record with `record.id`.
    ///
    /// Sensitive content is sealed before it is kept when a cipher is
    /// configured. A cipher failure is returned as
    /// [`MemoryError::Encryption`]; the record is never kept as plaintext instead.
    fn store(&self, record: &MemoryRecord) -> Result<(), MemoryError>;

    /// Fetch a decrypted view of the record, or `None` if absent.
    fn retrieve(&self, id: &str) -> Result<Option<MemoryRecord>, MemoryError>;

    /// The `limit` records most similar to `query_embedding`, with scores.
    ///
    /// Results are ordered by descending similarity, ties by insertion order.
    fn search_scored(&self, query_embedding: &[f32], limit: usize) -> Vec<ScoredRecord>;

    /// The `limit` records most similar to `query_embedding`.
    fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<MemoryRecord> {
        self.search_scored(query_embedding, limit)
            .into_iter()
            .map(|hit| hit.record)
            .collect()
    }

    /// Delete every record with `timestamp < cutoff`. Returns the count deleted.
    fn cleanup_before(&self, cutoff: DateTime<Utc>) -> usize;

    /// Delete every record older than `retention_days`. Returns the count deleted.
    ///
    /// A record exactly `retention_days` old is retained. A window reaching
    /// past the earliest representable time removes nothing.
    fn cleanup_old(&self, retention_days: u32) -> usize {
        match Utc::now().checked_sub_signed(Duration::days(i64::from(retention_days))) {
            Some(cutoff) => self.cleanup_before(cutoff),
            None => 0,
        }
    }

    /// Delete a single record. Returns whether it existed.
    fn delete(&self, id: &str) -> bool;

    /// Number of stored records.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
