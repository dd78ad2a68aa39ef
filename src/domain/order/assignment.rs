use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::entity::Order;
use super::errors::{EntityKind, OrderAction, OrderError};
use super::policy::can_transition;
use super::value_objects::{DeliveryInfo, OrderStatus};
use crate::domain::delivery::{CurrentOrder, Delivery, DeliveryStatus};
use crate::store::{run_transaction, DocumentKey, EntityStore};

// ============================================================================
// Order <-> Delivery assignment
// ============================================================================
//
// Both documents are read and both are written in one transaction: the order
// is never seen `assigned` without its courier marked `busy`, or the reverse.
// Every precondition is checked inside the transaction body so a failure
// aborts before any write is buffered for commit.
//
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderAssignmentPatch<'a> {
    delivery_id: &'a str,
    delivery_info: &'a DeliveryInfo,
    status: OrderStatus,
    assigned_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryAssignmentPatch<'a> {
    status: DeliveryStatus,
    current_order: &'a CurrentOrder,
    updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct OrderAssignmentCoordinator {
    store: Arc<dyn EntityStore>,
    require_free_courier: bool,
}

impl OrderAssignmentCoordinator {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            require_free_courier: false,
        }
    }

    /// Reject couriers that are already `busy` with another order.
    pub fn require_free_courier(mut self, enabled: bool) -> Self {
        self.require_free_courier = enabled;
        self
    }

    /// Binds `delivery_id` to `order_id` and returns the assigned order.
    pub async fn assign(&self, order_id: &str, delivery_id: &str) -> Result<Order, OrderError> {
        let order_id = order_id.to_string();
        let delivery_id = delivery_id.to_string();
        let require_free_courier = self.require_free_courier;

        let order = run_transaction(self.store.as_ref(), |tx| {
            let order_id = order_id.clone();
            let delivery_id = delivery_id.clone();

            Box::pin(async move {
                let order_key = DocumentKey::order(&order_id);
                let delivery_key = DocumentKey::delivery(&delivery_id);

                let order: Option<Order> = tx.get(&order_key).await?;
                let delivery: Option<Delivery> = tx.get(&delivery_key).await?;

                let mut order = order
                    .ok_or_else(|| OrderError::not_found(EntityKind::Order, &order_id))?
                    .with_id(&order_id);
                let delivery = delivery.ok_or_else(|| OrderError::not_found(EntityKind::Delivery, &delivery_id))?;

                if !can_transition(order.status, OrderStatus::Assigned) {
                    return Err(OrderError::InvalidState {
                        order_id,
                        current: order.status,
                        action: OrderAction::AssignDelivery,
                    });
                }

                if require_free_courier && delivery.is_busy() {
                    return Err(OrderError::DeliveryUnavailable { delivery_id });
                }

                let now = tx.now();
                let info = delivery.snapshot();
                let current_order = CurrentOrder {
                    order_id: order_id.clone(),
                    started_at: now,
                };

                tx.update(
                    &order_key,
                    &OrderAssignmentPatch {
                        delivery_id: &delivery_id,
                        delivery_info: &info,
                        status: OrderStatus::Assigned,
                        assigned_at: now,
                        updated_at: now,
                    },
                )?;
                tx.update(
                    &delivery_key,
                    &DeliveryAssignmentPatch {
                        status: DeliveryStatus::Busy,
                        current_order: &current_order,
                        updated_at: now,
                    },
                )?;

                order.delivery_id = Some(delivery_id);
                order.delivery_info = Some(info);
                order.status = OrderStatus::Assigned;
                order.assigned_at = Some(now);
                order.updated_at = now;

                Ok::<_, OrderError>(order)
            })
        })
        .await?;

        tracing::info!(
            order_id = %order.id,
            delivery_id = ?order.delivery_id,
            "✅ Delivery assigned to order"
        );

        Ok(order)
    }
}
