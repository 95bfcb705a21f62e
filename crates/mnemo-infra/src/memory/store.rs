//! In-memory implementation of the durable memory tier.
//!
//! Implements `DurableStore` from `mnemo-core` over a process-local map.
//! Each id maps to exactly one canonical entry; sensitive content is sealed
//! with the configured `ContentCipher` before it enters the map, and every
//! read builds a new decrypted view without touching the sealed copy.
//!
//! Key features:
//! - Keyed upsert that keeps an entry's original insertion position
//! - Brute-force cosine search, deterministic tie-breaking by insertion order
//! - Exclusive-boundary retention cleanup under a single write lock
//! - Sealing done outside the write lock

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use mnemo_core::memory::durable::DurableStore;
use mnemo_core::memory::similarity::rank_by_similarity;
use mnemo_core::service::cipher::ContentCipher;
use mnemo_types::error::{CipherError, MemoryError};
use mnemo_types::memory::{MemoryRecord, ScoredRecord, StoredContent};

/// Canonical at-rest copy of a record.
#[derive(Debug, Clone)]
struct StoredRecord {
    id: String,
    session_id: String,
    content: StoredContent,
    embedding: Vec<f32>,
    timestamp: DateTime<Utc>,
    metadata: HashMap<String, serde_json::Value>,
    is_sensitive: bool,
}

impl StoredRecord {
    fn from_record(record: &MemoryRecord, content: StoredContent) -> Self {
        Self {
            id: record.id.clone(),
            session_id: record.session_id.clone(),
            content,
            embedding: record.embedding.clone(),
            timestamp: record.timestamp,
            metadata: record.metadata.clone(),
            is_sensitive: record.is_sensitive,
        }
    }

    /// Build a caller-facing record carrying `content` as plaintext.
    fn view(&self, content: String) -> MemoryRecord {
        MemoryRecord {
            id: self.id.clone(),
            session_id: self.session_id.clone(),
            content,
            embedding: self.embedding.clone(),
            timestamp: self.timestamp,
            metadata: self.metadata.clone(),
            is_sensitive: self.is_sensitive,
        }
    }
}

/// Entries keyed by insertion sequence, plus an id -> sequence index.
///
/// Iterating `by_seq` yields records in insertion order, which is the
/// tie-break order for search.
#[derive(Default)]
struct StoreInner {
    by_seq: BTreeMap<u64, StoredRecord>,
    index: HashMap<String, u64>,
    next_seq: u64,
}

/// Process-local durable store with optional content encryption.
///
/// Without a cipher, sensitive records are kept as plaintext (with a warning)
/// and reading them back fails closed with [`MemoryError::Configuration`].
pub struct InMemoryDurableStore {
    inner: RwLock<StoreInner>,
    cipher: Option<Box<dyn ContentCipher>>,
}

impl InMemoryDurableStore {
    /// Create a store that keeps all content as plaintext.
    pub fn new() -> Self {
        Self::from_cipher(None)
    }

    /// Create a store that seals sensitive content with `cipher`.
    pub fn with_cipher(cipher: impl ContentCipher + 'static) -> Self {
        Self::from_cipher(Some(Box::new(cipher)))
    }

    pub fn from_cipher(cipher: Option<Box<dyn ContentCipher>>) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            cipher,
        }
    }

    /// Whether sensitive content is encrypted at rest.
    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// The at-rest representation of a record's content, for inspection.
    pub fn stored_content(&self, id: &str) -> Option<StoredContent> {
        let inner = self.inner.read().expect("durable store lock poisoned");
        inner
            .index
            .get(id)
            .and_then(|seq| inner.by_seq.get(seq))
            .map(|stored| stored.content.clone())
    }

    /// Compute the at-rest content for `record`.
    fn seal_content(&self, record: &MemoryRecord) -> Result<StoredContent, MemoryError> {
        if !record.is_sensitive {
            return Ok(StoredContent::Plain(record.content.clone()));
        }

        match &self.cipher {
            Some(cipher) => cipher
                .seal(record.content.as_bytes())
                .map(StoredContent::Sealed)
                .map_err(MemoryError::Encryption),
            None => {
                tracing::warn!(
                    record_id = %record.id,
                    "sensitive record stored as plaintext: no encryption key configured"
                );
                Ok(StoredContent::Plain(record.content.clone()))
            }
        }
    }

    /// Build a decrypted view of a stored entry. Never mutates `stored`.
    fn open_view(&self, stored: &StoredRecord) -> Result<MemoryRecord, MemoryError> {
        match (&stored.content, &self.cipher) {
            (StoredContent::Plain(text), _) if !stored.is_sensitive => Ok(stored.view(text.clone())),
            (StoredContent::Plain(_), None) => Err(MemoryError::Configuration(
                "sensitive record cannot be read without an encryption key".to_string(),
            )),
            (StoredContent::Plain(text), Some(_)) => Ok(stored.view(text.clone())),
            (StoredContent::Sealed(_), None) => Err(MemoryError::Configuration(
                "sealed record cannot be read without an encryption key".to_string(),
            )),
            (StoredContent::Sealed(blob), Some(cipher)) => {
                let plaintext = cipher.open(blob).map_err(MemoryError::Decryption)?;
                let text = String::from_utf8(plaintext)
                    .map_err(|_| MemoryError::Decryption(CipherError::DecryptionFailed))?;
                Ok(stored.view(text))
            }
        }
    }
}

impl Default for InMemoryDurableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InMemoryDurableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryDurableStore")
            .field("len", &self.len())
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}

impl DurableStore for InMemoryDurableStore {
    fn store(&self, record: &MemoryRecord) -> Result<(), MemoryError> {
        let content = self.seal_content(record)?;
        let stored = StoredRecord::from_record(record, content);

        let mut inner = self.inner.write().expect("durable store lock poisoned");
        let existing = inner.index.get(&record.id).copied();
        let seq = match existing {
            Some(seq) => seq,
            None => {
                let seq = inner.next_seq;
                inner.next_seq += 1;
                inner.index.insert(record.id.clone(), seq);
                seq
            }
        };
        inner.by_seq.insert(seq, stored);

        tracing::debug!(record_id = %record.id, sealed = record.is_sensitive && self.is_encrypted(), "stored durable record");
        Ok(())
    }

    fn retrieve(&self, id: &str) -> Result<Option<MemoryRecord>, MemoryError> {
        let stored = {
            let inner = self.inner.read().expect("durable store lock poisoned");
            match inner.index.get(id).and_then(|seq| inner.by_seq.get(seq)) {
                Some(stored) => stored.clone(),
                None => return Ok(None),
            }
        };
        self.open_view(&stored).map(Some)
    }

    fn search_scored(&self, query_embedding: &[f32], limit: usize) -> Vec<ScoredRecord> {
        if limit == 0 {
            return Vec::new();
        }

        let inner = self.inner.read().expect("durable store lock poisoned");
        let ranked = rank_by_similarity(
            query_embedding,
            inner
                .by_seq
                .values()
                .map(|stored| (stored.embedding.as_slice(), stored)),
            usize::MAX,
        );

        let mut hits = Vec::with_capacity(limit.min(ranked.len()));
        for (similarity, stored) in ranked {
            if hits.len() == limit {
                break;
            }
            match self.open_view(stored) {
                Ok(record) => hits.push(ScoredRecord { record, similarity }),
                Err(err) => {
                    tracing::warn!(record_id = %stored.id, error = %err, "omitting unreadable record from search results");
                }
            }
        }
        hits
    }

    fn cleanup_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut guard = self.inner.write().expect("durable store lock poisoned");
        let StoreInner { by_seq, index, .. } = &mut *guard;

        let before = by_seq.len();
        by_seq.retain(|_, stored| stored.timestamp >= cutoff);
        index.retain(|_, seq| by_seq.contains_key(seq));
        let removed = before - by_seq.len();

        tracing::debug!(removed, cutoff = %cutoff, "durable retention cleanup");
        removed
    }

    fn delete(&self, id: &str) -> bool {
        let mut inner = self.inner.write().expect("durable store lock poisoned");
        let Some(seq) = inner.index.remove(id) else {
            return false;
        };
        inner.by_seq.remove(&seq).is_some()
    }

    fn len(&self) -> usize {
        self.inner.read().expect("durable store lock poisoned").by_seq.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::vault::VaultCrypto;
    use chrono::Duration;
    use serde_json::json;

    fn test_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = (i as u8).wrapping_mul(7);
        }
        key
    }

    fn encrypted_store() -> InMemoryDurableStore {
        InMemoryDurableStore::with_cipher(VaultCrypto::new(&test_key()))
    }

    /// Cipher whose seal always fails.
    struct BrokenSealCipher;

    impl ContentCipher for BrokenSealCipher {
        fn seal(&self, _plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
            Err(CipherError::EncryptionFailed)
        }

        fn open(&self, _sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
            Err(CipherError::DecryptionFailed)
        }
    }

    /// Cipher that seals correctly but cannot open anything (simulates a wrong key).
    struct WrongKeyCipher(VaultCrypto);

    impl ContentCipher for WrongKeyCipher {
        fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
            self.0.seal(plaintext)
        }

        fn open(&self, _sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
            Err(CipherError::DecryptionFailed)
        }
    }

    fn ids(records: &[MemoryRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_store_and_retrieve_plain_record() {
        let store = InMemoryDurableStore::new();
        let record = MemoryRecord::new("1", "s1", "test").with_metadata("turn", json!(3));
        store.store(&record).unwrap();

        let retrieved = store.retrieve("1").unwrap().unwrap();
        assert_eq!(retrieved, record);
        assert_eq!(store.stored_content("1"), Some(StoredContent::Plain("test".to_string())));
    }

    #[test]
    fn test_retrieve_missing_is_none() {
        let store = encrypted_store();
        assert!(store.retrieve("nope").unwrap().is_none());
        assert!(store.stored_content("nope").is_none());
    }

    #[test]
    fn test_sensitive_record_is_sealed_at_rest() {
        let store = encrypted_store();
        store
            .store(&MemoryRecord::new("m1", "s1", "secret").sensitive())
            .unwrap();

        match store.stored_content("m1").unwrap() {
            StoredContent::Sealed(blob) => assert_ne!(blob, b"secret".to_vec()),
            other => panic!("expected sealed content, got {other:?}"),
        }
    }

    #[test]
    fn test_sensitive_retrieve_is_idempotent() {
        let store = encrypted_store();
        store
            .store(&MemoryRecord::new("m1", "s1", "secret").sensitive())
            .unwrap();
        let sealed_before = store.stored_content("m1").unwrap();

        let first = store.retrieve("m1").unwrap().unwrap();
        let second = store.retrieve("m1").unwrap().unwrap();

        assert_eq!(first.content, "secret");
        assert_eq!(second.content, "secret");
        assert!(first.is_sensitive);
        // Reading never rewrites the canonical sealed copy
        assert_eq!(store.stored_content("m1").unwrap(), sealed_before);
    }

    #[test]
    fn test_caller_mutation_does_not_reach_store() {
        let store = encrypted_store();
        let mut record = MemoryRecord::new("m1", "s1", "secret").sensitive();
        store.store(&record).unwrap();

        record.content = "changed after store".to_string();
        let mut view = store.retrieve("m1").unwrap().unwrap();
        view.content = "changed view".to_string();

        assert_eq!(store.retrieve("m1").unwrap().unwrap().content, "secret");
    }

    #[test]
    fn test_restoring_reseals_with_fresh_nonce() {
        let store = encrypted_store();
        let record = MemoryRecord::new("m1", "s1", "secret").sensitive();
        store.store(&record).unwrap();
        let first = store.stored_content("m1").unwrap();
        store.store(&record).unwrap();
        let second = store.stored_content("m1").unwrap();

        assert_ne!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(store.retrieve("m1").unwrap().unwrap().content, "secret");
    }

    #[test]
    fn test_encryption_failure_is_surfaced_and_nothing_is_stored() {
        let store = InMemoryDurableStore::with_cipher(BrokenSealCipher);
        let result = store.store(&MemoryRecord::new("m1", "s1", "secret").sensitive());

        assert!(matches!(result, Err(MemoryError::Encryption(CipherError::EncryptionFailed))));
        assert!(store.stored_content("m1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_non_sensitive_records_bypass_cipher() {
        let store = InMemoryDurableStore::with_cipher(BrokenSealCipher);
        store.store(&MemoryRecord::new("1", "s1", "public")).unwrap();
        assert_eq!(store.retrieve("1").unwrap().unwrap().content, "public");
    }

    #[test]
    fn test_decryption_failure_is_surfaced() {
        let store = InMemoryDurableStore::with_cipher(WrongKeyCipher(VaultCrypto::new(&test_key())));
        store
            .store(&MemoryRecord::new("m1", "s1", "secret").sensitive())
            .unwrap();

        let result = store.retrieve("m1");
        assert!(matches!(result, Err(MemoryError::Decryption(CipherError::DecryptionFailed))));
    }

    #[test]
    fn test_sensitive_without_key_fails_closed_on_read() {
        let store = InMemoryDurableStore::new();
        store
            .store(&MemoryRecord::new("m1", "s1", "secret").sensitive())
            .unwrap();

        assert!(!store.is_encrypted());
        assert!(matches!(store.retrieve("m1"), Err(MemoryError::Configuration(_))));
    }

    #[test]
    fn test_upsert_overwrites_existing_id() {
        let store = InMemoryDurableStore::new();
        store.store(&MemoryRecord::new("1", "s1", "first")).unwrap();
        store.store(&MemoryRecord::new("1", "s1", "second")).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.retrieve("1").unwrap().unwrap().content, "second");
    }

    #[test]
    fn test_search_returns_closest_first() {
        let store = InMemoryDurableStore::new();
        store
            .store(&MemoryRecord::new("x", "s1", "x").with_embedding(vec![1.0, 0.0]))
            .unwrap();
        store
            .store(&MemoryRecord::new("y", "s1", "y").with_embedding(vec![0.0, 1.0]))
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 1);
        assert_eq!(ids(&hits), vec!["x"]);
    }

    #[test]
    fn test_search_is_bounded_and_non_increasing() {
        let store = InMemoryDurableStore::new();
        for i in 0..25 {
            let angle = i as f32 * 0.1;
            store
                .store(&MemoryRecord::new(i.to_string(), "s1", "c").with_embedding(vec![angle.cos(), angle.sin()]))
                .unwrap();
        }

        for limit in [0, 1, 7, 25, 100] {
            let hits = store.search_scored(&[1.0, 0.0], limit);
            assert!(hits.len() <= limit);
            assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        }
        assert_eq!(store.search_scored(&[1.0, 0.0], 100).len(), 25);
    }

    #[test]
    fn test_search_ties_follow_insertion_order_even_after_upsert() {
        let store = InMemoryDurableStore::new();
        for id in ["a", "b", "c"] {
            store
                .store(&MemoryRecord::new(id, "s1", id).with_embedding(vec![1.0, 1.0]))
                .unwrap();
        }
        // Overwriting keeps "a" in its original position
        store
            .store(&MemoryRecord::new("a", "s1", "a2").with_embedding(vec![2.0, 2.0]))
            .unwrap();

        let hits = store.search(&[1.0, 1.0], 3);
        assert_eq!(ids(&hits), vec!["a", "b", "c"]);
        assert_eq!(hits[0].content, "a2");
    }

    #[test]
    fn test_search_excludes_empty_and_mismatched_embeddings() {
        let store = InMemoryDurableStore::new();
        store.store(&MemoryRecord::new("none", "s1", "c")).unwrap();
        store
            .store(&MemoryRecord::new("3d", "s1", "c").with_embedding(vec![1.0, 0.0, 0.0]))
            .unwrap();
        store
            .store(&MemoryRecord::new("2d", "s1", "c").with_embedding(vec![-1.0, 0.0]))
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 10);
        assert_eq!(ids(&hits), vec!["2d"]);
        assert!(store.search(&[], 10).is_empty());
    }

    #[test]
    fn test_search_on_empty_store_is_empty() {
        let store = encrypted_store();
        assert!(store.search(&[1.0, 0.0], 5).is_empty());
    }

    #[test]
    fn test_search_returns_decrypted_views() {
        let store = encrypted_store();
        store
            .store(&MemoryRecord::new("m1", "s1", "secret").with_embedding(vec![1.0, 0.0]).sensitive())
            .unwrap();

        let hits = store.search_scored(&[1.0, 0.0], 1);
        assert_eq!(hits[0].record.content, "secret");
        assert!((hits[0].similarity - 1.0).abs() < 1e-6);
        assert!(store.stored_content("m1").unwrap().is_sealed());
    }

    #[test]
    fn test_search_omits_unreadable_records_and_backfills() {
        let store = InMemoryDurableStore::new();
        store
            .store(&MemoryRecord::new("secret", "s1", "c").with_embedding(vec![1.0, 0.0]).sensitive())
            .unwrap();
        store
            .store(&MemoryRecord::new("public", "s1", "c").with_embedding(vec![0.9, 0.1]))
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 1);
        assert_eq!(ids(&hits), vec!["public"]);
    }

    #[test]
    fn test_cleanup_old_removes_only_expired() {
        let store = InMemoryDurableStore::new();
        store
            .store(&MemoryRecord::new("1", "s1", "old").with_timestamp(Utc::now() - Duration::days(40)))
            .unwrap();
        store.store(&MemoryRecord::new("2", "s1", "new")).unwrap();

        assert_eq!(store.cleanup_old(30), 1);
        assert!(store.retrieve("1").unwrap().is_none());
        assert!(store.retrieve("2").unwrap().is_some());
    }

    #[test]
    fn test_cleanup_boundary_is_exclusive() {
        let store = InMemoryDurableStore::new();
        let cutoff = Utc::now() - Duration::days(30);
        store
            .store(&MemoryRecord::new("at", "s1", "c").with_timestamp(cutoff))
            .unwrap();
        store
            .store(&MemoryRecord::new("before", "s1", "c").with_timestamp(cutoff - Duration::milliseconds(1)))
            .unwrap();
        store
            .store(&MemoryRecord::new("after", "s1", "c").with_timestamp(cutoff + Duration::milliseconds(1)))
            .unwrap();

        assert_eq!(store.cleanup_before(cutoff), 1);
        assert!(store.retrieve("before").unwrap().is_none());
        assert!(store.retrieve("at").unwrap().is_some());
        assert!(store.retrieve("after").unwrap().is_some());
    }

    #[test]
    fn test_cleanup_old_with_huge_window_removes_nothing() {
        let store = InMemoryDurableStore::new();
        let ancient = Utc::now() - Duration::days(365 * 1000);
        store.store(&MemoryRecord::new("1", "s1", "c").with_timestamp(ancient)).unwrap();

        assert_eq!(store.cleanup_old(100_000_000), 0);
        assert_eq!(store.cleanup_old(u32::MAX), 0);
        assert!(store.retrieve("1").unwrap().is_some());
    }

    #[test]
    fn test_cleanup_keeps_index_consistent() {
        let store = InMemoryDurableStore::new();
        let old = Utc::now() - Duration::days(10);
        store.store(&MemoryRecord::new("1", "s1", "c").with_timestamp(old)).unwrap();
        store.cleanup_old(5);

        // A re-stored id gets a fresh entry
        store.store(&MemoryRecord::new("1", "s1", "again")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.retrieve("1").unwrap().unwrap().content, "again");
    }

    #[test]
    fn test_delete_removes_single_record() {
        let store = InMemoryDurableStore::new();
        store.store(&MemoryRecord::new("1", "s1", "c")).unwrap();

        assert!(store.delete("1"));
        assert!(!store.delete("1"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_search_sees_consistent_snapshots() {
        let store = InMemoryDurableStore::new();
        let old = Utc::now() - Duration::days(40);
        for i in 0..200 {
            let record = MemoryRecord::new(format!("old-{i}"), "s1", "c")
                .with_embedding(vec![1.0, 0.0])
                .with_timestamp(old);
            store.store(&record).unwrap();
        }
        for i in 0..50 {
            store
                .store(&MemoryRecord::new(format!("new-{i}"), "s1", "c").with_embedding(vec![1.0, 0.0]))
                .unwrap();
        }

        std::thread::scope(|scope| {
            scope.spawn(|| {
                assert_eq!(store.cleanup_old(30), 200);
            });
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..20 {
                        let count = store.search(&[1.0, 0.0], usize::MAX).len();
                        assert!(count == 250 || count == 50, "observed partial cleanup: {count}");
                    }
                });
            }
        });

        assert_eq!(store.len(), 50);
    }

    #[test]
    fn test_debug_output_has_no_content() {
        let store = encrypted_store();
        store.store(&MemoryRecord::new("1", "s1", "top secret").sensitive()).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("encrypted: true"));
        assert!(!debug.contains("top secret"));
    }
}
