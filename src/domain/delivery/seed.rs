use serde::Deserialize;
use std::sync::Arc;

use super::entity::{Delivery, DeliveryStatus, PersonalInfo, VehicleInfo};
use crate::store::{DocumentKey, EntityStore, StoreError};

/// A courier record loaded at startup, one `[[deliveries]]` table in the
/// config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliverySeed {
    pub id: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
    #[serde(default = "free")]
    pub status: DeliveryStatus,
}

fn free() -> DeliveryStatus {
    DeliveryStatus::Free
}

impl DeliverySeed {
    pub fn to_delivery(&self) -> Delivery {
        let personal_info = (self.name.is_some() || self.phone.is_some()).then(|| PersonalInfo {
            name: self.name.clone(),
            phone: self.phone.clone(),
        });
        let vehicle_info = (self.vehicle_type.is_some() || self.license_plate.is_some()).then(|| VehicleInfo {
            vehicle_type: self.vehicle_type.clone(),
            license_plate: self.license_plate.clone(),
        });

        Delivery {
            personal_info,
            vehicle_info,
            status: Some(self.status),
            current_order: None,
            updated_at: None,
        }
    }
}

/// Writes each seed to the `deliveries` collection, replacing any existing
/// document with the same id. Returns how many were written.
pub async fn seed_deliveries(store: &Arc<dyn EntityStore>, seeds: &[DeliverySeed]) -> Result<usize, StoreError> {
    let now = store.now();

    for seed in seeds {
        let delivery = Delivery {
            updated_at: Some(now),
            ..seed.to_delivery()
        };
        store.put(&DocumentKey::delivery(&seed.id), &delivery, false).await?;
        tracing::debug!(delivery_id = %seed.id, status = ?seed.status, "Courier seeded");
    }

    Ok(seeds.len())
}
