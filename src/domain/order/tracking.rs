use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

use super::commands::LocationUpdate;
use super::entity::Order;
use super::errors::{EntityKind, OrderAction, OrderError};
use super::value_objects::{DeliveryTracking, OrderStatus, RouteSummary};
use crate::store::{run_transaction, DocumentKey, EntityStore, Transaction};

// ============================================================================
// Route and live tracking data
// ============================================================================
//
// Neither write touches `status`. Both re-read the order inside the
// transaction and check that it is still in a state that accepts the data.
//
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoutePatch<'a> {
    route: &'a RouteSummary,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackingPatch<'a> {
    delivery_tracking: &'a DeliveryTracking,
    updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct OrderTrackingRecorder {
    store: Arc<dyn EntityStore>,
}

impl OrderTrackingRecorder {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Stores a route computed for the order. Rejected once the order is
    /// delivered or canceled.
    pub async fn attach_route(&self, order_id: &str, route: RouteSummary) -> Result<Order, OrderError> {
        let order_id = order_id.to_string();

        let order = run_transaction(self.store.as_ref(), |tx| {
            let order_id = order_id.clone();
            let route = route.clone();

            Box::pin(async move {
                let (key, mut order) = load(tx, &order_id).await?;
                if order.status.is_terminal() {
                    return Err(OrderError::InvalidState {
                        order_id,
                        current: order.status,
                        action: OrderAction::PlanRoute,
                    });
                }

                let now = tx.now();
                tx.update(&key, &RoutePatch { route: &route, updated_at: now })?;

                order.route = Some(route);
                order.updated_at = now;
                Ok::<_, OrderError>(order)
            })
        })
        .await?;

        tracing::info!(order_id = %order.id, "Route attached to order");
        Ok(order)
    }

    /// Replaces the tracking snapshot while a courier is on the order.
    pub async fn record_location(&self, order_id: &str, update: LocationUpdate) -> Result<Order, OrderError> {
        update.validate()?;
        let order_id = order_id.to_string();

        let order = run_transaction(self.store.as_ref(), |tx| {
            let order_id = order_id.clone();
            let update = update.clone();

            Box::pin(async move {
                let (key, mut order) = load(tx, &order_id).await?;
                if !matches!(order.status, OrderStatus::Assigned | OrderStatus::OnWay) {
                    return Err(OrderError::InvalidState {
                        order_id,
                        current: order.status,
                        action: OrderAction::RecordLocation,
                    });
                }

                let now = tx.now();
                let tracking = DeliveryTracking {
                    current_latitude: update.latitude,
                    current_longitude: update.longitude,
                    last_update: now,
                    is_moving: update.is_moving.unwrap_or(true),
                    speed: update.speed,
                };
                tx.update(
                    &key,
                    &TrackingPatch {
                        delivery_tracking: &tracking,
                        updated_at: now,
                    },
                )?;

                order.delivery_tracking = Some(tracking);
                order.updated_at = now;
                Ok::<_, OrderError>(order)
            })
        })
        .await?;

        tracing::debug!(order_id = %order.id, "Delivery location recorded");
        Ok(order)
    }
}

async fn load(tx: &mut Transaction<'_>, order_id: &str) -> Result<(DocumentKey, Order), OrderError> {
    let key = DocumentKey::order(order_id);
    let order = tx
        .get::<Order>(&key)
        .await?
        .ok_or_else(|| OrderError::not_found(EntityKind::Order, order_id))?
        .with_id(order_id);
    Ok((key, order))
}
