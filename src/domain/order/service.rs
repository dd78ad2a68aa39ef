use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use validator::Validate;

use super::assignment::OrderAssignmentCoordinator;
use super::commands::{CreateOrder, LocationUpdate};
use super::entity::Order;
use super::errors::{EntityKind, OrderAction, OrderError};
use super::number::OrderNumberGenerator;
use super::routing::RoutePlanner;
use super::status::OrderStatusUpdater;
use super::tracking::OrderTrackingRecorder;
use super::value_objects::OrderStatus;
use crate::metrics::Metrics;
use crate::store::{collections, DocumentKey, EntityStore};
use crate::utils::IsTransient;

// ============================================================================
// Order Service
// ============================================================================
//
// Orchestrates: validated input → number / policy → transactional write →
// refreshed order. Every public operation runs under the configured timeout
// and is measured; a timed out operation is reported, never retried here.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct OrderServiceConfig {
    pub operation_timeout: Duration,
    pub require_free_courier: bool,
}

impl Default for OrderServiceConfig {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(5),
            require_free_courier: false,
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn EntityStore>,
    numbers: OrderNumberGenerator,
    assignments: OrderAssignmentCoordinator,
    statuses: OrderStatusUpdater,
    tracking: OrderTrackingRecorder,
    metrics: Arc<Metrics>,
    timeout: Duration,
}

impl OrderService {
    pub fn new(store: Arc<dyn EntityStore>, metrics: Arc<Metrics>, config: OrderServiceConfig) -> Self {
        Self {
            numbers: OrderNumberGenerator::new(store.clone()),
            assignments: OrderAssignmentCoordinator::new(store.clone())
                .require_free_courier(config.require_free_courier),
            statuses: OrderStatusUpdater::new(store.clone()),
            tracking: OrderTrackingRecorder::new(store.clone()),
            store,
            metrics,
            timeout: config.operation_timeout,
        }
    }

    /// Same service with a different per-operation timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn create_order(&self, input: CreateOrder) -> Result<Order, OrderError> {
        self.observe("create_order", async move {
            input.validate()?;

            let order_number = self.numbers.next().await?;
            let id = self.store.allocate_id(collections::ORDERS);
            let key = DocumentKey::order(&id);

            let order = Order::new(id.clone(), order_number, input, self.store.now());
            self.store.put(&key, &order, false).await?;

            let stored = self
                .store
                .fetch::<Order>(&key)
                .await?
                .ok_or_else(|| OrderError::not_found(EntityKind::Order, &id))?
                .with_id(&id);

            self.metrics.record_order_created();
            tracing::info!(
                order_id = %stored.id,
                order_number = %stored.order_number,
                "✅ Order created"
            );

            Ok::<_, OrderError>(stored)
        })
        .await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order, OrderError> {
        self.observe("get_order", self.read_order(order_id)).await
    }

    pub async fn assign_delivery(&self, order_id: &str, delivery_id: &str) -> Result<Order, OrderError> {
        let result = self
            .observe("assign_delivery", self.assignments.assign(order_id, delivery_id))
            .await;

        match &result {
            Ok(_) => {
                self.metrics.record_assignment("assigned");
                self.metrics.record_transition(OrderStatus::Confirmed, OrderStatus::Assigned);
            }
            Err(error) => self.metrics.record_assignment(error.kind()),
        }

        result
    }

    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<Order, OrderError> {
        let (order, previous) = self
            .observe("update_status", self.statuses.update_status(order_id, status))
            .await?;

        self.metrics.record_transition(previous, order.status);
        Ok(order)
    }

    /// Asks `planner` for a route from the restaurant to the delivery address
    /// and stores it on the order. The planner runs outside the transaction.
    /// Not routed over HTTP: callers embedding the library bring the planner.
    pub async fn plan_route(&self, order_id: &str, planner: &dyn RoutePlanner) -> Result<Order, OrderError> {
        self.observe("plan_route", async move {
            let order = self.read_order(order_id).await?;
            if order.status.is_terminal() {
                return Err(OrderError::InvalidState {
                    order_id: order.id,
                    current: order.status,
                    action: OrderAction::PlanRoute,
                });
            }

            let route = planner.plan(order.restaurant_location(), order.destination()).await?;
            self.tracking.attach_route(order_id, route).await
        })
        .await
    }

    pub async fn record_location(&self, order_id: &str, update: LocationUpdate) -> Result<Order, OrderError> {
        self.observe("record_location", self.tracking.record_location(order_id, update))
            .await
    }

    async fn read_order(&self, order_id: &str) -> Result<Order, OrderError> {
        let order = self
            .store
            .fetch::<Order>(&DocumentKey::order(order_id))
            .await?
            .ok_or_else(|| OrderError::not_found(EntityKind::Order, order_id))?;
        Ok(order.with_id(order_id))
    }

    async fn observe<T, F>(&self, operation: &'static str, fut: F) -> Result<T, OrderError>
    where
        F: Future<Output = Result<T, OrderError>>,
    {
        let started = Instant::now();

        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(OrderError::Timeout {
                operation,
                after: self.timeout,
            }),
        };

        let elapsed = started.elapsed();
        self.metrics
            .record_operation(operation, elapsed.as_secs_f64(), result.as_ref().err());

        if let Err(error) = &result {
            if error.is_transient() {
                tracing::warn!(
                    operation = operation,
                    error = %error,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Order operation failed, safe to retry"
                );
            } else {
                tracing::debug!(operation = operation, error = %error, "Order operation rejected");
            }
        }

        result
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
