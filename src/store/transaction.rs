use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};

use super::document::{encode, DocumentKey, ReadSet, Write, WriteOp};
use super::entity_store::EntityStore;
use super::errors::StoreError;
use crate::utils::IsTransient;

// ============================================================================
// Transactions - optimistic, retried on conflict
// ============================================================================
//
// A `Transaction` records the version of every document it reads and buffers
// every write. Nothing reaches the store until the body returns `Ok`, at which
// point the read set and the writes are handed to `EntityStore::commit` in one
// call. A stale read set makes the commit fail with a conflict and the whole
// body runs again against fresh data, up to the store's retry budget.
//
// Rules for bodies:
// - all reads happen before the first write to the same document
// - no I/O other than the transaction handle (the body may run several times)
//
// ============================================================================

pub struct Transaction<'s> {
    store: &'s dyn EntityStore,
    reads: ReadSet,
    writes: Vec<Write>,
}

impl<'s> Transaction<'s> {
    fn new(store: &'s dyn EntityStore) -> Self {
        Self {
            store,
            reads: ReadSet::new(),
            writes: Vec::new(),
        }
    }

    pub async fn get<D: DeserializeOwned>(&mut self, key: &DocumentKey) -> Result<Option<D>, StoreError> {
        if self.writes.iter().any(|write| &write.key == key) {
            return Err(StoreError::ReadAfterWrite(key.clone()));
        }

        let doc = self.store.get(key).await?;
        let version = doc.as_ref().map_or(0, |d| d.version);

        // A second read keeps the first observed version so that a change in
        // between still fails the commit.
        self.reads.entry(key.clone()).or_insert(version);

        tracing::debug!(key = %key, version = version, "Transactional read");

        match doc {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    pub fn set<D: Serialize>(&mut self, key: &DocumentKey, doc: &D, merge: bool) -> Result<(), StoreError> {
        self.writes.push(Write {
            key: key.clone(),
            op: WriteOp::Set {
                fields: encode(doc)?,
                merge,
            },
        });
        Ok(())
    }

    pub fn update<P: Serialize>(&mut self, key: &DocumentKey, patch: &P) -> Result<(), StoreError> {
        self.writes.push(Write {
            key: key.clone(),
            op: WriteOp::Update { fields: encode(patch)? },
        });
        Ok(())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.store.now()
    }
}

/// Runs `body` inside a transaction, re-running it while the commit conflicts.
///
/// The body's own errors abort immediately and are returned untouched; no
/// buffered write is applied in that case. Once the retry budget is spent the
/// error is `StoreError::RetriesExhausted` converted into `E`.
pub async fn run_transaction<T, E, F>(store: &dyn EntityStore, mut body: F) -> Result<T, E>
where
    F: for<'t> FnMut(&'t mut Transaction<'_>) -> BoxFuture<'t, Result<T, E>> + Send,
    T: Send,
    E: From<StoreError> + Send,
{
    let mut backoff = store.retry_config().backoff();

    loop {
        let attempt = backoff.start_attempt();
        let mut tx = Transaction::new(store);

        let value = body(&mut tx).await?;

        let Transaction { reads, writes, .. } = tx;
        let write_count = writes.len();

        match store.commit(&reads, writes).await {
            Ok(()) => {
                if attempt > 1 {
                    tracing::info!(
                        attempt = attempt,
                        writes = write_count,
                        "Transaction committed after retry"
                    );
                }
                return Ok(value);
            }
            Err(error) if error.is_transient() => {
                if backoff.exhausted() {
                    tracing::error!(
                        attempt = attempt,
                        error = %error,
                        "Transaction failed after all retries"
                    );
                    return Err(StoreError::RetriesExhausted { attempts: attempt }.into());
                }

                let delay = backoff.next_delay();
                tracing::warn!(
                    attempt = attempt,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "Transaction conflicted, retrying after delay"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error.into()),
        }
    }
}
