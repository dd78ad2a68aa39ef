use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::entity::Order;
use super::errors::{EntityKind, OrderError};
use super::policy::can_transition;
use super::value_objects::OrderStatus;
use crate::store::{run_transaction, DocumentKey, EntityStore};

// ============================================================================
// Status updates
// ============================================================================
//
// Policy check and write happen in one transaction against the status read
// inside it, so a concurrent change turns into a retry instead of a lost
// update.
//
// ============================================================================

/// Fields written by a status change: the status, `updatedAt`, and the
/// milestone timestamp of the destination status, if it has one.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusPatch {
    status: OrderStatus,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confirmed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assigned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delivered_at: Option<DateTime<Utc>>,
}

impl StatusPatch {
    fn new(status: OrderStatus, now: DateTime<Utc>) -> Self {
        let mut patch = Self {
            status,
            updated_at: now,
            confirmed_at: None,
            assigned_at: None,
            started_at: None,
            delivered_at: None,
        };

        match status {
            OrderStatus::Confirmed => patch.confirmed_at = Some(now),
            OrderStatus::Assigned => patch.assigned_at = Some(now),
            OrderStatus::OnWay => patch.started_at = Some(now),
            OrderStatus::Delivered => patch.delivered_at = Some(now),
            OrderStatus::Pending | OrderStatus::Canceled => {}
        }

        patch
    }

    fn apply_to(&self, order: &mut Order) {
        order.status = self.status;
        order.updated_at = self.updated_at;
        order.confirmed_at = self.confirmed_at.or(order.confirmed_at);
        order.assigned_at = self.assigned_at.or(order.assigned_at);
        order.started_at = self.started_at.or(order.started_at);
        order.delivered_at = self.delivered_at.or(order.delivered_at);
    }
}

/// The only writer of `Order.status` besides assignment.
#[derive(Clone)]
pub struct OrderStatusUpdater {
    store: Arc<dyn EntityStore>,
}

impl OrderStatusUpdater {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn update_status(&self, order_id: &str, requested: OrderStatus) -> Result<(Order, OrderStatus), OrderError> {
        let order_id = order_id.to_string();

        let (order, previous) = run_transaction(self.store.as_ref(), |tx| {
            let order_id = order_id.clone();

            Box::pin(async move {
                let key = DocumentKey::order(&order_id);
                let mut order = tx
                    .get::<Order>(&key)
                    .await?
                    .ok_or_else(|| OrderError::not_found(EntityKind::Order, &order_id))?
                    .with_id(&order_id);

                let previous = order.status;
                if !can_transition(previous, requested) {
                    return Err(OrderError::InvalidTransition {
                        order_id,
                        from: previous,
                        to: requested,
                    });
                }

                let patch = StatusPatch::new(requested, tx.now());
                tx.update(&key, &patch)?;
                patch.apply_to(&mut order);

                Ok::<_, OrderError>((order, previous))
            })
        })
        .await?;

        tracing::info!(
            order_id = %order.id,
            from = %previous,
            to = %order.status,
            "✅ Order status updated"
        );

        Ok((order, previous))
    }
}
