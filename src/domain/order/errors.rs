use std::fmt;
use std::time::Duration;
use validator::{ValidationErrors, ValidationErrorsKind};

use super::routing::RoutingError;
use super::value_objects::OrderStatus;
use crate::store::StoreError;
use crate::utils::IsTransient;

// ============================================================================
// Order Errors
// ============================================================================
//
// Taxonomy surfaced to callers:
// - NotFound                                    -> 404
// - InvalidTransition / InvalidState / Validation -> 400, never retried
// - TransientStoreConflict / Timeout            -> safe to retry with backoff
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Order,
    Delivery,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Order => f.write_str("Order"),
            EntityKind::Delivery => f.write_str("Delivery"),
        }
    }
}

/// Operations that depend on the order's current status without changing it
/// through the status updater.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    AssignDelivery,
    PlanRoute,
    RecordLocation,
}

impl OrderAction {
    /// Status the action would move the order into, if any.
    pub fn target_status(&self) -> Option<OrderStatus> {
        match self {
            OrderAction::AssignDelivery => Some(OrderStatus::Assigned),
            OrderAction::PlanRoute | OrderAction::RecordLocation => None,
        }
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderAction::AssignDelivery => f.write_str("assign a delivery"),
            OrderAction::PlanRoute => f.write_str("plan a route"),
            OrderAction::RecordLocation => f.write_str("record a location"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Order {order_id} is {current}, cannot {action}")]
    InvalidState {
        order_id: String,
        current: OrderStatus,
        action: OrderAction,
    },

    #[error("Delivery {delivery_id} is already busy")]
    DeliveryUnavailable { delivery_id: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Store contention, gave up after {attempts} attempts; retry later")]
    TransientStoreConflict { attempts: u32 },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Route unavailable: {0}")]
    RouteUnavailable(#[from] RoutingError),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl OrderError {
    pub fn not_found(kind: EntityKind, id: &str) -> Self {
        OrderError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Short label used in metrics and API payloads
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::NotFound { .. } => "not_found",
            OrderError::InvalidTransition { .. } => "invalid_transition",
            OrderError::InvalidState { .. } => "invalid_state",
            OrderError::DeliveryUnavailable { .. } => "delivery_unavailable",
            OrderError::ValidationFailed(_) => "validation_failed",
            OrderError::TransientStoreConflict { .. } => "transient_store_conflict",
            OrderError::Timeout { .. } => "timeout",
            OrderError::RouteUnavailable(_) => "route_unavailable",
            OrderError::Store(_) => "store",
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::RetriesExhausted { attempts } => OrderError::TransientStoreConflict { attempts },
            other => OrderError::Store(other),
        }
    }
}

/// Flattens field errors into `path: message` entries, sorted so the text is
/// stable across runs.
impl From<ValidationErrors> for OrderError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_messages("", &errors, &mut messages);
        messages.sort();
        OrderError::ValidationFailed(messages.join("; "))
    }
}

fn collect_messages(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(failures) => {
                out.extend(failures.iter().map(|failure| match &failure.message {
                    Some(message) => format!("{path}: {message}"),
                    None => format!("{path}: failed {}", failure.code),
                }));
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_messages(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}

impl IsTransient for OrderError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            OrderError::TransientStoreConflict { .. } | OrderError::Timeout { .. }
        )
    }
}
