use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::DriverStatus;
use crate::models::request::DeliveryRequest;
use crate::models::stop::Stop;

/// Output of the planner. Nothing is persisted until the plan is confirmed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedRoute {
    pub ordered_stops: Vec<Stop>,
    pub total_distance_km: f64,
    pub total_duration_seconds: f64,
    pub request_ids: BTreeSet<Uuid>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    Active,
    Completed,
}

/// A route before the directory has given it an id.
#[derive(Debug, Clone)]
pub struct RouteDraft {
    pub driver_id: Uuid,
    pub delivery_request_ids: BTreeSet<Uuid>,
    pub start_time: DateTime<Utc>,
    pub estimated_end_time: DateTime<Utc>,
    pub total_distance_km: f64,
    pub total_duration_seconds: f64,
    pub waypoints: Vec<Stop>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub delivery_request_ids: BTreeSet<Uuid>,
    pub status: RouteStatus,
    pub start_time: DateTime<Utc>,
    pub estimated_end_time: DateTime<Utc>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub total_distance_km: f64,
    pub total_duration_seconds: f64,
    pub waypoints: Vec<Stop>,
}

impl Route {
    pub fn from_draft(id: Uuid, draft: RouteDraft) -> Self {
        Self {
            id,
            driver_id: draft.driver_id,
            delivery_request_ids: draft.delivery_request_ids,
            status: RouteStatus::Active,
            start_time: draft.start_time,
            estimated_end_time: draft.estimated_end_time,
            actual_end_time: None,
            total_distance_km: draft.total_distance_km,
            total_duration_seconds: draft.total_duration_seconds,
            waypoints: draft.waypoints,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteCompletionResult {
    pub route: Route,
    pub request: DeliveryRequest,
    pub route_completed: bool,
    pub driver_status: DriverStatus,
    pub driver_current_deliveries: u32,
}

/// Change notifications fanned out to subscribers after a lifecycle
/// operation has committed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteEvent {
    RouteCreated {
        route_id: Uuid,
        driver_id: Uuid,
        request_ids: BTreeSet<Uuid>,
    },
    DeliveryCompleted {
        route_id: Uuid,
        request_id: Uuid,
        remaining: usize,
    },
    RouteCompleted {
        route_id: Uuid,
        driver_id: Uuid,
        actual_end_time: DateTime<Utc>,
    },
}
