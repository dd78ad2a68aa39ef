use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::commands::non_negative_amount;

// ============================================================================
// Order Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Assigned,
    OnWay,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Assigned,
        OrderStatus::OnWay,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Assigned => "assigned",
            OrderStatus::OnWay => "on_way",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Pen,
    Usd,
}

// Input snapshots below reject unknown JSON keys; they are also what gets
// stored on the order document.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CustomerInfo {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[validate(length(min = 1, max = 30))]
    pub phone: String,
    #[validate(email(message = "must be a valid email address"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RestaurantInfo {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[validate(length(min = 1, max = 30))]
    pub phone: String,
    #[validate(length(min = 1, max = 160))]
    pub address: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeliveryAddress {
    #[validate(length(min = 1, max = 160))]
    pub full_address: String,
    #[validate(length(min = 1, max = 60))]
    pub district: String,
    #[validate(length(max = 140))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderItem {
    #[validate(length(min = 1, max = 64))]
    pub product_id: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u32,
    #[validate(custom(function = "non_negative_amount"))]
    pub price: f64,
    #[validate(length(max = 140))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Courier snapshot copied onto the order at assignment time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
    pub name: String,
    pub phone: String,
    pub vehicle_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
}

/// Summary returned by the routing provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub distance: String,
    pub duration: String,
    pub duration_in_seconds: u64,
    pub polyline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_arrival: Option<DateTime<Utc>>,
}

/// Last known courier position for an order in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryTracking {
    pub current_latitude: f64,
    pub current_longitude: f64,
    pub last_update: DateTime<Utc>,
    pub is_moving: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert_eq!(OrderStatus::OnWay.to_string(), "on_way");
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result: Result<OrderStatus, _> = serde_json::from_str("\"preparing\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_currency_defaults_to_pen() {
        assert_eq!(Currency::default(), Currency::Pen);
        assert_eq!(serde_json::to_string(&Currency::Usd).unwrap(), "\"USD\"");
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let info = DeliveryInfo {
            name: "Rider".to_string(),
            phone: "".to_string(),
            vehicle_type: "bicycle".to_string(),
            license_plate: None,
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["vehicleType"], "bicycle");
        assert!(json.get("licensePlate").is_none());
    }

    #[test]
    fn test_geo_point_bounds() {
        assert!(GeoPoint::new(-12.1, -77.0).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
    }
}
