use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::stop::Coordinate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Assigned,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub id: Uuid,
    pub status: RequestStatus,
    pub pickup: Option<Coordinate>,
    pub pickup_address: String,
    pub delivery: Option<Coordinate>,
    pub delivery_address: String,
    pub is_priority: bool,
    pub distance_km: Option<f64>,
    pub estimated_duration_seconds: Option<f64>,
    pub assigned_driver_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DeliveryRequest {
    pub fn assignment(&self) -> RequestAssignment {
        RequestAssignment {
            status: self.status,
            assigned_driver_id: self.assigned_driver_id,
            batch_id: self.batch_id,
            accepted_at: self.accepted_at,
            delivery_time: self.delivery_time,
        }
    }
}

/// The slice of a request the route lifecycle is allowed to write. Writes
/// always carry every field so a snapshot taken before a write restores
/// the request exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestAssignment {
    pub status: RequestStatus,
    pub assigned_driver_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PendingSort {
    #[default]
    Created,
    Distance,
    Time,
    Priority,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PendingFilter {
    #[serde(default)]
    pub priority_only: bool,
    #[serde(default)]
    pub sort: PendingSort,
}
