use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use super::value_objects::{Currency, CustomerInfo, DeliveryAddress, OrderItem, RestaurantInfo};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================
//
// Field rules are declared with `validator`; `OrderError` converts the
// collected `ValidationErrors` into a single 400 message.
//
// ============================================================================

/// Everything needed to place an order; number, status and timestamps are
/// assigned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateOrder {
    #[validate(length(min = 1, max = 64))]
    pub customer_id: String,
    #[validate(nested)]
    pub customer_info: CustomerInfo,
    #[validate(length(min = 1, max = 64))]
    pub restaurant_id: String,
    #[validate(nested)]
    pub restaurant_info: RestaurantInfo,
    #[validate(nested)]
    pub delivery_address: DeliveryAddress,
    #[validate(length(min = 1, message = "order must contain at least one item"), nested)]
    pub items: Vec<OrderItem>,
    #[validate(custom(function = "non_negative_amount"))]
    pub subtotal: f64,
    #[validate(custom(function = "non_negative_amount"))]
    pub delivery_fee: f64,
    #[validate(custom(function = "non_negative_amount"))]
    pub total: f64,
    #[serde(default)]
    pub currency: Currency,
    #[validate(length(max = 200))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Courier position report for an order in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = "validate_speed"))]
pub struct LocationUpdate {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub is_moving: Option<bool>,
}

/// Money fields: finite and >= 0. `range` alone lets NaN through.
pub(crate) fn non_negative_amount(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        return Ok(());
    }

    let mut error = ValidationError::new("non_negative_amount");
    error.message = Some(Cow::from(format!("must be a finite amount >= 0, got {value}")));
    Err(error)
}

fn validate_speed(update: &LocationUpdate) -> Result<(), ValidationError> {
    match update.speed {
        Some(speed) => non_negative_amount(speed).map_err(|mut error| {
            error.message = Some(Cow::from(format!("speed must be >= 0, got {speed}")));
            error
        }),
        None => Ok(()),
    }
}
