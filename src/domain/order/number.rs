use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::errors::OrderError;
use crate::store::{run_transaction, DocumentKey, EntityStore};

// ============================================================================
// Order numbers - YYMMDD-NNNN
// ============================================================================
//
// One shared counter document (`counters/orders`) hands out the sequence. The
// counter is global and never resets per day, so the date prefix only tells
// when the number was issued and the sequence grows past four digits once it
// exceeds 9999.
//
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct OrderCounter {
    #[serde(default)]
    current: u64,
}

#[derive(Clone)]
pub struct OrderNumberGenerator {
    store: Arc<dyn EntityStore>,
}

impl OrderNumberGenerator {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Claims the next sequence value and formats it with today's date.
    pub async fn next(&self) -> Result<String, OrderError> {
        // Single clock read, taken before the transaction so retries reuse it
        let issued_at = self.store.now();

        let sequence = run_transaction(self.store.as_ref(), |tx| {
            Box::pin(async move {
                let key = DocumentKey::order_counter();
                let counter: OrderCounter = tx.get(&key).await?.unwrap_or_default();
                let next = counter.current + 1;
                tx.set(&key, &OrderCounter { current: next }, true)?;
                Ok::<_, OrderError>(next)
            })
        })
        .await?;

        let number = format_order_number(issued_at, sequence);
        tracing::debug!(sequence = sequence, order_number = %number, "Issued order number");
        Ok(number)
    }
}

pub fn format_order_number(issued_at: DateTime<Utc>, sequence: u64) -> String {
    format!("{}-{:04}", issued_at.format("%y%m%d"), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryEntityStore;
    use chrono::TimeZone;

    #[test]
    fn test_format_pads_to_four_digits() {
        let date = Utc.with_ymd_and_hms(2025, 3, 7, 23, 59, 0).unwrap();

        assert_eq!(format_order_number(date, 1), "250307-0001");
        assert_eq!(format_order_number(date, 9999), "250307-9999");
    }

    #[test]
    fn test_sequence_past_9999_widens() {
        let date = Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(format_order_number(date, 10000), "251231-10000");
    }

    #[tokio::test]
    async fn test_counter_is_shared_and_monotonic() {
        let store: Arc<dyn EntityStore> = Arc::new(InMemoryEntityStore::new());
        let generator = OrderNumberGenerator::new(store.clone());

        let first = generator.next().await.unwrap();
        let second = generator.next().await.unwrap();

        assert!(first.ends_with("-0001"));
        assert!(second.ends_with("-0002"));

        let counter: OrderCounter = store.fetch(&DocumentKey::order_counter()).await.unwrap().unwrap();
        assert_eq!(counter.current, 2);
    }

    #[tokio::test]
    async fn test_existing_counter_is_continued() {
        let store: Arc<dyn EntityStore> = Arc::new(InMemoryEntityStore::new());
        store
            .put(&DocumentKey::order_counter(), &OrderCounter { current: 41 }, false)
            .await
            .unwrap();

        let number = OrderNumberGenerator::new(store).next().await.unwrap();
        assert!(number.ends_with("-0042"));
    }
}
