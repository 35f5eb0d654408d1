use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::stop::Coordinate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    #[default]
    Bike,
    Scooter,
    Car,
    Walk,
    /// Anything the directory knows about but we have no speed for.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    Available,
    Busy,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub current_coordinate: Option<Coordinate>,
    pub vehicle_type: VehicleType,
    pub max_concurrent_deliveries: u32,
    pub current_deliveries: u32,
    pub status: DriverStatus,
    pub average_rating: f64,
    pub total_deliveries: u32,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn remaining_capacity(&self) -> u32 {
        self.max_concurrent_deliveries
            .saturating_sub(self.current_deliveries)
    }
}
