//! Memory types for mnemo.
//!
//! These types model a single conversational interaction as it moves
//! through the two memory tiers: the bounded recency buffer and the
//! durable, optionally encrypted, searchable store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single interaction record.
///
/// Records are built by the request-handling layer and handed to the
/// memory coordinator once. Each tier keeps its own copy, so mutating a
/// value returned from one tier never affects another tier or a later read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Primary key of the durable store. Assigned by the caller.
    pub id: String,
    /// Groups records into a conversation. Not unique.
    pub session_id: String,
    /// Plaintext payload.
    pub content: String,
    /// Semantic vector supplied by an external embedder. Empty means "not searchable".
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// Creation time. Only used as the retention clock of the durable store.
    pub timestamp: DateTime<Utc>,
    /// Opaque caller data, never interpreted by the memory subsystem.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Whether the durable store encrypts `content` at rest.
    #[serde(default)]
    pub is_sensitive: bool,
}

impl MemoryRecord {
    /// Create a non-sensitive record stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        session_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            content: content.into(),
            embedding: Vec::new(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
            is_sensitive: false,
        }
    }

    /// Generate a fresh, time-sortable record id.
    pub fn generate_id() -> String {
        Uuid::now_v7().to_string()
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Override the creation time (imports, backfills, tests).
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Mark the record as sensitive so its content is encrypted at rest.
    pub fn sensitive(mut self) -> Self {
        self.is_sensitive = true;
        self
    }

    /// Whether the record can take part in similarity search.
    pub fn is_searchable(&self) -> bool {
        !self.embedding.is_empty()
    }
}

/// At-rest representation of a record's content in the durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredContent {
    /// Stored as given.
    Plain(String),
    /// `nonce || ciphertext || tag`, produced by the configured cipher.
    Sealed(Vec<u8>),
}

impl StoredContent {
    pub fn is_sealed(&self) -> bool {
        matches!(self, StoredContent::Sealed(_))
    }
}

/// A similarity search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// Decrypted view of the stored record.
    pub record: MemoryRecord,
    /// Cosine similarity against the query, in `[-1, 1]`.
    pub similarity: f32,
}

/// Point-in-time sizes of both memory tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub short_term_size: usize,
    pub short_term_capacity: usize,
    pub long_term_size: usize,
}
