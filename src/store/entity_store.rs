use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use super::document::{encode, DocumentKey, Fields, ReadSet, VersionedDocument, Write};
use super::errors::StoreError;
use crate::utils::RetryConfig;

// ============================================================================
// EntityStore - the document store seam
// ============================================================================
//
// Everything the order core needs from persistence:
// 1. Point reads returning the document and its version
// 2. Point writes (replace or merge) and field updates on existing documents
// 3. An atomic multi-document commit that rejects stale read sets
// 4. The server clock and the retry budget for conflicting transactions
//
// Transactions themselves are driven by `run_transaction`, which only relies
// on `get` and `commit`.
//
// ============================================================================

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get(&self, key: &DocumentKey) -> Result<Option<VersionedDocument>, StoreError>;

    async fn set(&self, key: &DocumentKey, fields: Fields, merge: bool) -> Result<(), StoreError>;

    /// Fails with `DocumentMissing` when the document does not exist.
    async fn update(&self, key: &DocumentKey, fields: Fields) -> Result<(), StoreError>;

    /// Applies every write atomically, provided each key in `reads` still has
    /// the observed version. Otherwise nothing is applied and `Conflict` is returned.
    async fn commit(&self, reads: &ReadSet, writes: Vec<Write>) -> Result<(), StoreError>;

    fn now(&self) -> DateTime<Utc>;

    fn retry_config(&self) -> RetryConfig;

    fn allocate_id(&self, _collection: &str) -> String {
        Uuid::now_v7().simple().to_string()
    }
}

impl dyn EntityStore {
    /// Typed point read outside any transaction.
    pub async fn fetch<D: DeserializeOwned>(&self, key: &DocumentKey) -> Result<Option<D>, StoreError> {
        match self.get(key).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Typed point write outside any transaction.
    pub async fn put<D: Serialize>(&self, key: &DocumentKey, doc: &D, merge: bool) -> Result<(), StoreError> {
        self.set(key, encode(doc)?, merge).await
    }
}
