use std::cmp::Ordering;

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::driver::{Driver, DriverStatus};
use crate::models::request::{
    DeliveryRequest, PendingFilter, PendingSort, RequestAssignment, RequestStatus,
};
use crate::models::route::{Route, RouteDraft, RouteStatus};
use crate::models::stop::Coordinate;
use crate::store::{Directory, StoreError};

#[derive(Default)]
pub struct MemoryDirectory {
    drivers: DashMap<Uuid, Driver>,
    requests: DashMap<Uuid, DeliveryRequest>,
    routes: DashMap<Uuid, Route>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_driver(&self, driver: Driver) {
        self.drivers.insert(driver.id, driver);
    }

    pub fn insert_request(&self, request: DeliveryRequest) {
        self.requests.insert(request.id, request);
    }

    pub fn set_driver_location(
        &self,
        id: Uuid,
        coordinate: Coordinate,
    ) -> Result<Driver, StoreError> {
        let mut driver = self.drivers.get_mut(&id).ok_or(StoreError::Missing {
            entity: "driver",
            id,
        })?;
        driver.current_coordinate = Some(coordinate);
        driver.updated_at = Utc::now();
        Ok(driver.clone())
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (self.drivers.len(), self.requests.len(), self.routes.len())
    }
}

impl Directory for MemoryDirectory {
    fn get_driver(&self, id: Uuid) -> Result<Option<Driver>, StoreError> {
        Ok(self.drivers.get(&id).map(|entry| entry.value().clone()))
    }

    fn list_drivers(&self, status: Option<DriverStatus>) -> Result<Vec<Driver>, StoreError> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .iter()
            .filter(|entry| status.is_none_or(|s| entry.value().status == s))
            .map(|entry| entry.value().clone())
            .collect();
        drivers.sort_by_key(|driver| driver.id);
        Ok(drivers)
    }

    fn get_request(&self, id: Uuid) -> Result<Option<DeliveryRequest>, StoreError> {
        Ok(self.requests.get(&id).map(|entry| entry.value().clone()))
    }

    fn list_pending_requests(
        &self,
        filter: &PendingFilter,
    ) -> Result<Vec<DeliveryRequest>, StoreError> {
        let mut pending: Vec<DeliveryRequest> = self
            .requests
            .iter()
            .filter(|entry| {
                let request = entry.value();
                request.status == RequestStatus::Pending
                    && request.assigned_driver_id.is_none()
                    && (!filter.priority_only || request.is_priority)
            })
            .map(|entry| entry.value().clone())
            .collect();

        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        match filter.sort {
            PendingSort::Created => {}
            PendingSort::Distance => {
                pending.sort_by(|a, b| unknown_last(a.distance_km, b.distance_km))
            }
            PendingSort::Time => pending.sort_by(|a, b| {
                unknown_last(a.estimated_duration_seconds, b.estimated_duration_seconds)
            }),
            PendingSort::Priority => pending.sort_by_key(|request| !request.is_priority),
        }

        Ok(pending)
    }

    fn get_route(&self, id: Uuid) -> Result<Option<Route>, StoreError> {
        Ok(self.routes.get(&id).map(|entry| entry.value().clone()))
    }

    fn list_routes(
        &self,
        driver_id: Uuid,
        status: Option<RouteStatus>,
    ) -> Result<Vec<Route>, StoreError> {
        let mut routes: Vec<Route> = self
            .routes
            .iter()
            .filter(|entry| {
                let route = entry.value();
                route.driver_id == driver_id && status.is_none_or(|s| route.status == s)
            })
            .map(|entry| entry.value().clone())
            .collect();

        routes.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(routes)
    }

    fn save_route(&self, draft: RouteDraft) -> Result<Route, StoreError> {
        let route = Route::from_draft(Uuid::new_v4(), draft);
        self.routes.insert(route.id, route.clone());
        Ok(route)
    }

    fn update_route(&self, route: &Route) -> Result<(), StoreError> {
        let mut stored = self.routes.get_mut(&route.id).ok_or(StoreError::Missing {
            entity: "route",
            id: route.id,
        })?;
        *stored = route.clone();
        Ok(())
    }

    fn delete_route(&self, id: Uuid) -> Result<(), StoreError> {
        self.routes
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::Missing { entity: "route", id })
    }

    fn update_request_status(
        &self,
        id: Uuid,
        assignment: RequestAssignment,
    ) -> Result<(), StoreError> {
        let mut request = self.requests.get_mut(&id).ok_or(StoreError::Missing {
            entity: "delivery request",
            id,
        })?;
        request.status = assignment.status;
        request.assigned_driver_id = assignment.assigned_driver_id;
        request.batch_id = assignment.batch_id;
        request.accepted_at = assignment.accepted_at;
        request.delivery_time = assignment.delivery_time;
        Ok(())
    }

    fn update_driver_status(
        &self,
        id: Uuid,
        status: DriverStatus,
        current_deliveries: u32,
    ) -> Result<(), StoreError> {
        let mut driver = self.drivers.get_mut(&id).ok_or(StoreError::Missing {
            entity: "driver",
            id,
        })?;
        driver.status = status;
        driver.current_deliveries = current_deliveries;
        driver.updated_at = Utc::now();
        Ok(())
    }
}

/// Ascending order with requests lacking an estimate at the end.
fn unknown_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
