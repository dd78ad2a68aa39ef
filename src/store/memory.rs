use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::document::{apply_write, DocumentKey, Fields, ReadSet, VersionedDocument, Write, WriteOp};
use super::entity_store::EntityStore;
use super::errors::StoreError;
use crate::utils::RetryConfig;

// ============================================================================
// In-memory EntityStore
// ============================================================================
//
// Process-local document store with the same optimistic concurrency contract
// a remote document database offers: versions per document, commits validated
// against the read set under a single write lock, first committer wins.
//
// ============================================================================

pub struct InMemoryEntityStore {
    documents: RwLock<HashMap<DocumentKey, VersionedDocument>>,
    retry: RetryConfig,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::with_retry(RetryConfig::aggressive())
    }

    pub fn with_retry(retry: RetryConfig) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            retry,
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

impl Default for InMemoryEntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<VersionedDocument>, StoreError> {
        // Reads are suspension points, like a round trip to a remote store
        tokio::task::yield_now().await;
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn set(&self, key: &DocumentKey, fields: Fields, merge: bool) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let next = apply_write(key, documents.get(key), &WriteOp::Set { fields, merge })?;
        documents.insert(key.clone(), next);
        Ok(())
    }

    async fn update(&self, key: &DocumentKey, fields: Fields) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let next = apply_write(key, documents.get(key), &WriteOp::Update { fields })?;
        documents.insert(key.clone(), next);
        Ok(())
    }

    async fn commit(&self, reads: &ReadSet, writes: Vec<Write>) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;

        for (key, expected) in reads {
            let actual = documents.get(key).map_or(0, |doc| doc.version);
            if actual != *expected {
                return Err(StoreError::Conflict {
                    key: key.clone(),
                    expected: *expected,
                    actual,
                });
            }
        }

        // Stage everything first so a failing write leaves the map untouched
        let mut staged: HashMap<DocumentKey, VersionedDocument> = HashMap::new();
        for write in &writes {
            let current = staged.get(&write.key).or_else(|| documents.get(&write.key));
            let next = apply_write(&write.key, current, &write.op)?;
            staged.insert(write.key.clone(), next);
        }

        tracing::debug!(
            reads = reads.len(),
            writes = writes.len(),
            "Committed transaction"
        );

        documents.extend(staged);
        Ok(())
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn retry_config(&self) -> RetryConfig {
        self.retry.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::run_transaction;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Default)]
    struct Counter {
        #[serde(default)]
        current: u64,
    }

    fn fast_retry(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        }
    }

    async fn increment(store: &dyn EntityStore) -> Result<u64, StoreError> {
        run_transaction(store, |tx| {
            Box::pin(async move {
                let key = DocumentKey::order_counter();
                let counter: Counter = tx.get(&key).await?.unwrap_or_default();
                let next = counter.current + 1;
                tx.set(&key, &Counter { current: next }, true)?;
                Ok::<_, StoreError>(next)
            })
        })
        .await
    }

    #[tokio::test]
    async fn test_point_write_and_read() {
        let store: Arc<dyn EntityStore> = Arc::new(InMemoryEntityStore::new());
        let key = DocumentKey::order_counter();

        store.put(&key, &Counter { current: 4 }, false).await.unwrap();
        let counter: Counter = store.fetch(&key).await.unwrap().unwrap();

        assert_eq!(counter.current, 4);
        assert_eq!(store.get(&key).await.unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = InMemoryEntityStore::new();
        let key = DocumentKey::delivery("ghost");
        let fields = crate::store::encode(&json!({"status": "busy"})).unwrap();

        let result = store.update(&key, fields).await;
        assert!(matches!(result, Err(StoreError::DocumentMissing(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_commit_rejects_stale_read_set() {
        let store = InMemoryEntityStore::new();
        let key = DocumentKey::order_counter();
        store.set(&key, crate::store::encode(&Counter { current: 1 }).unwrap(), false).await.unwrap();

        let mut reads = ReadSet::new();
        reads.insert(key.clone(), 1);

        // Someone else commits in between
        store.set(&key, crate::store::encode(&Counter { current: 2 }).unwrap(), false).await.unwrap();

        let result = store
            .commit(&reads, vec![Write {
                key: key.clone(),
                op: WriteOp::Set { fields: crate::store::encode(&Counter { current: 99 }).unwrap(), merge: false },
            }])
            .await;

        assert!(matches!(result, Err(StoreError::Conflict { expected: 1, actual: 2, .. })));
        let counter: Counter = store.get(&key).await.unwrap().unwrap().decode().unwrap();
        assert_eq!(counter.current, 2);
    }

    #[tokio::test]
    async fn test_failed_write_in_commit_applies_nothing() {
        let store = InMemoryEntityStore::new();
        let present = DocumentKey::order("o1");
        let missing = DocumentKey::delivery("d-missing");
        store.set(&present, crate::store::encode(&json!({"status": "confirmed"})).unwrap(), false).await.unwrap();

        let result = store
            .commit(&ReadSet::new(), vec![
                Write {
                    key: present.clone(),
                    op: WriteOp::Update { fields: crate::store::encode(&json!({"status": "assigned"})).unwrap() },
                },
                Write {
                    key: missing.clone(),
                    op: WriteOp::Update { fields: crate::store::encode(&json!({"status": "busy"})).unwrap() },
                },
            ])
            .await;

        assert!(matches!(result, Err(StoreError::DocumentMissing(_))));
        let doc = store.get(&present).await.unwrap().unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.data["status"], json!("confirmed"));
    }

    #[tokio::test]
    async fn test_transaction_body_error_discards_writes() {
        let store = InMemoryEntityStore::new();

        let result: Result<(), StoreError> = run_transaction(&store, |tx| {
            Box::pin(async move {
                tx.set(&DocumentKey::order("o1"), &json!({"status": "pending"}), false)?;
                Err::<(), _>(StoreError::Backend("boom".to_string()))
            })
        })
        .await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_read_after_write_is_rejected() {
        let store = InMemoryEntityStore::new();

        let result: Result<(), StoreError> = run_transaction(&store, |tx| {
            Box::pin(async move {
                let key = DocumentKey::order("o1");
                tx.set(&key, &json!({"status": "pending"}), false)?;
                let _: Option<Counter> = tx.get(&key).await?;
                Ok::<_, StoreError>(())
            })
        })
        .await;

        assert!(matches!(result, Err(StoreError::ReadAfterWrite(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_serialized() {
        let store = Arc::new(InMemoryEntityStore::with_retry(fast_retry(64)));
        let mut handles = Vec::new();

        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { increment(store.as_ref()).await }));
        }

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap().unwrap());
        }
        values.sort_unstable();

        assert_eq!(values, (1..=32).collect::<Vec<u64>>());
    }

    /// Store whose commits always lose the race.
    struct AlwaysConflicting(InMemoryEntityStore);

    #[async_trait]
    impl EntityStore for AlwaysConflicting {
        async fn get(&self, key: &DocumentKey) -> Result<Option<VersionedDocument>, StoreError> {
            self.0.get(key).await
        }

        async fn set(&self, key: &DocumentKey, fields: Fields, merge: bool) -> Result<(), StoreError> {
            self.0.set(key, fields, merge).await
        }

        async fn update(&self, key: &DocumentKey, fields: Fields) -> Result<(), StoreError> {
            self.0.update(key, fields).await
        }

        async fn commit(&self, _reads: &ReadSet, _writes: Vec<Write>) -> Result<(), StoreError> {
            Err(StoreError::Conflict {
                key: DocumentKey::order_counter(),
                expected: 0,
                actual: 1,
            })
        }

        fn now(&self) -> DateTime<Utc> {
            self.0.now()
        }

        fn retry_config(&self) -> RetryConfig {
            fast_retry(3)
        }
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion() {
        let store = AlwaysConflicting(InMemoryEntityStore::new());

        let result = increment(&store).await;

        assert!(matches!(result, Err(StoreError::RetriesExhausted { attempts: 3 })));
        assert!(store.0.is_empty().await);
    }
}
