use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::commands::CreateOrder;
use super::value_objects::*;

// ============================================================================
// Order - the stored document
// ============================================================================
//
// `id` is the document id and is never written into the document itself; it is
// filled in after every read. Milestone timestamps are absent until the
// matching status is first reached.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub order_number: String,

    pub customer_id: String,
    pub customer_info: CustomerInfo,
    pub restaurant_id: String,
    pub restaurant_info: RestaurantInfo,
    pub delivery_address: DeliveryAddress,
    pub items: Vec<OrderItem>,

    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total: f64,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_info: Option<DeliveryInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_tracking: Option<DeliveryTracking>,

    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A fresh `pending` order built from validated input.
    pub fn new(id: String, order_number: String, input: CreateOrder, now: DateTime<Utc>) -> Self {
        Self {
            id,
            order_number,
            customer_id: input.customer_id,
            customer_info: input.customer_info,
            restaurant_id: input.restaurant_id,
            restaurant_info: input.restaurant_info,
            delivery_address: input.delivery_address,
            items: input.items,
            subtotal: input.subtotal,
            delivery_fee: input.delivery_fee,
            total: input.total,
            currency: input.currency,
            notes: input.notes,
            status: OrderStatus::Pending,
            delivery_id: None,
            delivery_info: None,
            route: None,
            delivery_tracking: None,
            created_at: now,
            confirmed_at: None,
            assigned_at: None,
            started_at: None,
            delivered_at: None,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn restaurant_location(&self) -> GeoPoint {
        GeoPoint::new(self.restaurant_info.latitude, self.restaurant_info.longitude)
    }

    pub fn destination(&self) -> GeoPoint {
        GeoPoint::new(self.delivery_address.latitude, self.delivery_address.longitude)
    }
}
