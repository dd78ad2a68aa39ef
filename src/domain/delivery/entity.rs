use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::order::DeliveryInfo;

const DEFAULT_NAME: &str = "Delivery";
const DEFAULT_VEHICLE: &str = "motorcycle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Free,
    Busy,
    /// Any status this service does not manage (offline, suspended, ...)
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    #[serde(default, rename = "type")]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentOrder {
    pub order_id: String,
    pub started_at: DateTime<Utc>,
}

/// The parts of a courier document order assignment cares about. Profile
/// fields may be missing on real records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_info: Option<PersonalInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_info: Option<VehicleInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_order: Option<CurrentOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Delivery {
    pub fn is_busy(&self) -> bool {
        self.status == Some(DeliveryStatus::Busy)
    }

    /// Snapshot denormalized onto the order, with placeholders for missing
    /// profile fields.
    pub fn snapshot(&self) -> DeliveryInfo {
        let personal = self.personal_info.clone().unwrap_or_default();
        let vehicle = self.vehicle_info.clone().unwrap_or_default();

        DeliveryInfo {
            name: personal.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            phone: personal.phone.unwrap_or_default(),
            vehicle_type: vehicle.vehicle_type.unwrap_or_else(|| DEFAULT_VEHICLE.to_string()),
            license_plate: vehicle.license_plate.filter(|plate| !plate.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_copies_profile() {
        let delivery: Delivery = serde_json::from_value(json!({
            "personalInfo": {"name": "Carlos", "phone": "+51 900 000 001"},
            "vehicleInfo": {"type": "bicycle", "licensePlate": "ABC-123"},
            "status": "free",
            "rating": 4.9
        }))
        .unwrap();

        let info = delivery.snapshot();
        assert_eq!(info.name, "Carlos");
        assert_eq!(info.phone, "+51 900 000 001");
        assert_eq!(info.vehicle_type, "bicycle");
        assert_eq!(info.license_plate.as_deref(), Some("ABC-123"));
        assert!(!delivery.is_busy());
    }

    #[test]
    fn test_snapshot_defaults_for_bare_record() {
        let delivery: Delivery = serde_json::from_value(json!({})).unwrap();
        let info = delivery.snapshot();

        assert_eq!(info.name, "Delivery");
        assert_eq!(info.phone, "");
        assert_eq!(info.vehicle_type, "motorcycle");
        assert_eq!(info.license_plate, None);
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let delivery: Delivery = serde_json::from_value(json!({"status": "offline"})).unwrap();
        assert_eq!(delivery.status, Some(DeliveryStatus::Other));

        let busy: Delivery = serde_json::from_value(json!({"status": "busy"})).unwrap();
        assert!(busy.is_busy());
    }
}
