//! MemoryCoordinator -- the single entry point over both memory tiers.
//!
//! Every interaction is written to the recency buffer and then to the durable
//! store. The durable store is the source of truth; the recency buffer is a
//! best-effort cache of recent activity. A failed durable write is reported to
//! the caller but does not undo the buffer write, so the two tiers are only
//! eventually consistent.
//!
//! The coordinator is built once at startup and shared (e.g. behind an `Arc`)
//! by every request handler. There is no global instance.

use mnemo_types::config::MemoryConfig;
use mnemo_types::error::MemoryError;
use mnemo_types::memory::{MemoryRecord, MemoryStats};

use super::durable::DurableStore;
use super::recency::RecencyBuffer;

/// Facade composing the recency buffer and a durable store.
#[derive(Debug)]
pub struct MemoryCoordinator<S> {
    short_term: RecencyBuffer,
    long_term: S,
    config: MemoryConfig,
}

impl<S: DurableStore> MemoryCoordinator<S> {
    /// Create a coordinator over the given tiers with default settings.
    pub fn new(short_term: RecencyBuffer, long_term: S) -> Self {
        let config = MemoryConfig {
            short_term_capacity: short_term.capacity(),
            ..MemoryConfig::default()
        };
        Self {
            short_term,
            long_term,
            config,
        }
    }

    /// Create a coordinator sized and tuned by `config`.
    pub fn from_config(config: &MemoryConfig, long_term: S) -> Result<Self, MemoryError> {
        let capacity = config.capacity()?;
        Ok(Self {
            short_term: RecencyBuffer::new(capacity),
            long_term,
            config: config.clone(),
        })
    }

    /// Settings this coordinator was built with.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// The durable tier, for adapter-specific inspection.
    pub fn long_term(&self) -> &S {
        &self.long_term
    }

    /// Write an interaction to both tiers.
    ///
    /// The recency buffer write always succeeds and is kept even when the
    /// durable write fails; the durable error is returned so the caller can
    /// retry or alert.
    #[tracing::instrument(
        name = "store_interaction",
        skip_all,
        fields(record_id = %record.id, session_id = %record.session_id)
    )]
    pub fn store_interaction(&self, record: MemoryRecord) -> Result<(), MemoryError> {
        if !self.config.enabled {
            tracing::trace!("memory disabled, dropping interaction");
            return Ok(());
        }

        self.short_term.add(record.clone());

        if let Err(err) = self.long_term.store(&record) {
            tracing::warn!(error = %err, "durable write failed; interaction kept in recency buffer only");
            return Err(err);
        }
        Ok(())
    }

    /// Records most similar to `query_embedding`, most similar first.
    ///
    /// Returns an empty list when nothing is comparable.
    pub fn retrieve_context(&self, query_embedding: &[f32], limit: usize) -> Vec<MemoryRecord> {
        if !self.config.enabled {
            return Vec::new();
        }
        self.long_term.search(query_embedding, limit)
    }

    /// [`retrieve_context`](Self::retrieve_context) with the configured `context_limit`.
    pub fn retrieve_default_context(&self, query_embedding: &[f32]) -> Vec<MemoryRecord> {
        self.retrieve_context(query_embedding, self.config.context_limit)
    }

    /// Buffered records of one session, in insertion order.
    ///
    /// Reads only the recency buffer: older turns of a long or quiet session
    /// may already have been evicted and are not fetched from the durable store.
    pub fn get_conversation_history(&self, session_id: &str) -> Vec<MemoryRecord> {
        self.short_term.get_by_session(session_id)
    }

    /// The last `limit` interactions across all sessions, oldest first.
    pub fn recent_interactions(&self, limit: usize) -> Vec<MemoryRecord> {
        self.short_term.get_recent(limit)
    }

    /// [`recent_interactions`](Self::recent_interactions) with the configured `recent_limit`.
    pub fn recent_default_interactions(&self) -> Vec<MemoryRecord> {
        self.recent_interactions(self.config.recent_limit)
    }

    /// Decrypted view of a single durable record.
    pub fn retrieve(&self, id: &str) -> Result<Option<MemoryRecord>, MemoryError> {
        self.long_term.retrieve(id)
    }

    /// Delete durable records older than `retention_days`.
    ///
    /// The recency buffer is left alone; it only shrinks by capacity eviction.
    pub fn cleanup_old_memories(&self, retention_days: u32) -> usize {
        let removed = self.long_term.cleanup_old(retention_days);
        tracing::info!(removed, retention_days, "cleaned up old memories");
        removed
    }

    /// [`cleanup_old_memories`](Self::cleanup_old_memories) with the configured `retention_days`.
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_old_memories(self.config.retention_days)
    }

    /// Empty the recency buffer. Durable records are untouched.
    pub fn clear_short_term(&self) {
        self.short_term.clear();
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            short_term_size: self.short_term.len(),
            short_term_capacity: self.short_term.capacity(),
            long_term_size: self.long_term.len(),
        }
    }
}
