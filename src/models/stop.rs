use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StopRole {
    Pickup,
    Delivery,
}

/// A pickup or delivery waypoint of a route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stop {
    pub request_id: Uuid,
    pub role: StopRole,
    pub coordinate: Coordinate,
    pub is_priority: bool,
}

impl Stop {
    pub fn pickup(request_id: Uuid, coordinate: Coordinate, is_priority: bool) -> Self {
        Self {
            request_id,
            role: StopRole::Pickup,
            coordinate,
            is_priority,
        }
    }

    pub fn delivery(request_id: Uuid, coordinate: Coordinate, is_priority: bool) -> Self {
        Self {
            request_id,
            role: StopRole::Delivery,
            coordinate,
            is_priority,
        }
    }

    pub fn is_pickup(&self) -> bool {
        self.role == StopRole::Pickup
    }
}
