//! Persisted route state transitions.
//!
//! Each operation writes through the [`Directory`] one entity at a time and
//! records how to undo every write. If a later write fails, the recorded
//! undos run newest-first and the original error is returned, so callers
//! never observe a half-applied route. All writes touching one driver are
//! serialized behind that driver's lock.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::planner::check_plan;
use crate::error::AppError;
use crate::models::driver::{Driver, DriverStatus};
use crate::models::request::{DeliveryRequest, RequestAssignment, RequestStatus};
use crate::models::route::{PlannedRoute, Route, RouteCompletionResult, RouteDraft, RouteStatus};
use crate::store::{Directory, StoreError};

type Undo = Box<dyn FnOnce(&dyn Directory) -> Result<(), StoreError> + Send>;

/// Compensating actions for the writes performed so far.
struct Saga<'a> {
    directory: &'a dyn Directory,
    undo: Vec<(&'static str, Undo)>,
}

impl<'a> Saga<'a> {
    fn new(directory: &'a dyn Directory) -> Self {
        Self {
            directory,
            undo: Vec::new(),
        }
    }

    fn step<T>(
        &mut self,
        name: &'static str,
        write: impl FnOnce(&dyn Directory) -> Result<T, StoreError>,
        undo: impl FnOnce(&T) -> Undo,
    ) -> Result<T, AppError> {
        match write(self.directory) {
            Ok(value) => {
                self.undo.push((name, undo(&value)));
                Ok(value)
            }
            Err(err) => {
                self.rollback(name, &err);
                Err(AppError::Persistence(err))
            }
        }
    }

    fn rollback(&mut self, failed: &'static str, cause: &StoreError) {
        warn!(
            step = failed,
            error = %cause,
            undo_steps = self.undo.len(),
            "write failed; rolling back"
        );

        while let Some((name, undo)) = self.undo.pop() {
            if let Err(err) = undo(self.directory) {
                error!(step = name, error = %err, "rollback step failed");
            }
        }
    }

    fn commit(self) {}
}

fn restore_request(request: &DeliveryRequest) -> Undo {
    let id = request.id;
    let previous = request.assignment();
    Box::new(move |directory: &dyn Directory| directory.update_request_status(id, previous))
}

fn restore_driver(driver: &Driver) -> Undo {
    let (id, status, current) = (driver.id, driver.status, driver.current_deliveries);
    Box::new(move |directory: &dyn Directory| directory.update_driver_status(id, status, current))
}

fn restore_route(route: &Route) -> Undo {
    let previous = route.clone();
    Box::new(move |directory: &dyn Directory| directory.update_route(&previous))
}

fn expected_end(start: DateTime<Utc>, duration_seconds: f64) -> Result<DateTime<Utc>, AppError> {
    // `as` saturates, so oversized durations fail in the checked add below.
    let millis = (duration_seconds.max(0.0) * 1000.0).round() as i64;
    Duration::try_milliseconds(millis)
        .and_then(|duration| start.checked_add_signed(duration))
        .ok_or_else(|| {
            AppError::BadRequest(format!("route duration {duration_seconds} s is out of range"))
        })
}

pub struct RouteLifecycle {
    directory: Arc<dyn Directory>,
    driver_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl RouteLifecycle {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self {
            directory,
            driver_locks: DashMap::new(),
        }
    }

    async fn lock_driver(&self, driver_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .driver_locks
            .entry(driver_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    fn load_driver(&self, driver_id: Uuid) -> Result<Driver, AppError> {
        self.directory
            .get_driver(driver_id)?
            .ok_or(AppError::DriverNotFound(driver_id))
    }

    fn load_request(&self, request_id: Uuid) -> Result<DeliveryRequest, AppError> {
        self.directory
            .get_request(request_id)?
            .ok_or(AppError::RequestNotFound(request_id))
    }

    pub async fn create_route(
        &self,
        driver_id: Uuid,
        planned: &PlannedRoute,
    ) -> Result<Route, AppError> {
        if planned.request_ids.is_empty() {
            return Err(AppError::BadRequest(
                "planned route covers no delivery requests".to_string(),
            ));
        }
        check_plan(planned)?;

        let _guard = self.lock_driver(driver_id).await;

        let driver = self.load_driver(driver_id)?;
        let requested = u32::try_from(planned.request_ids.len()).unwrap_or(u32::MAX);
        if driver.current_deliveries.saturating_add(requested) > driver.max_concurrent_deliveries {
            return Err(AppError::CapacityExceeded {
                driver_id,
                current: driver.current_deliveries,
                requested,
                max: driver.max_concurrent_deliveries,
            });
        }
        if driver.status != DriverStatus::Available {
            return Err(AppError::DriverUnavailable {
                driver_id,
                status: driver.status,
            });
        }

        let requests = planned
            .request_ids
            .iter()
            .map(|&id| {
                let request = self.load_request(id)?;
                if request.status != RequestStatus::Pending || request.assigned_driver_id.is_some()
                {
                    return Err(AppError::RequestNotPending(id));
                }
                Ok(request)
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let now = Utc::now();
        let estimated_end_time = expected_end(now, planned.total_duration_seconds)?;
        let draft = RouteDraft {
            driver_id,
            delivery_request_ids: planned.request_ids.clone(),
            start_time: now,
            estimated_end_time,
            total_distance_km: planned.total_distance_km,
            total_duration_seconds: planned.total_duration_seconds,
            waypoints: planned.ordered_stops.clone(),
        };

        let mut saga = Saga::new(self.directory.as_ref());

        let route = saga.step(
            "save_route",
            |directory| directory.save_route(draft),
            |route: &Route| {
                let id = route.id;
                Box::new(move |directory: &dyn Directory| directory.delete_route(id))
            },
        )?;

        for request in &requests {
            let assignment = RequestAssignment {
                status: RequestStatus::Assigned,
                assigned_driver_id: Some(driver_id),
                batch_id: Some(route.id),
                accepted_at: Some(now),
                delivery_time: request.delivery_time,
            };
            saga.step(
                "assign_request",
                |directory| directory.update_request_status(request.id, assignment),
                |_| restore_request(request),
            )?;
        }

        saga.step(
            "occupy_driver",
            |directory| {
                directory.update_driver_status(
                    driver_id,
                    DriverStatus::Busy,
                    driver.current_deliveries + requested,
                )
            },
            |_| restore_driver(&driver),
        )?;

        saga.commit();

        info!(
            route_id = %route.id,
            driver_id = %driver_id,
            requests = requested,
            stops = route.waypoints.len(),
            distance_km = route.total_distance_km,
            "route created"
        );

        Ok(route)
    }

    pub async fn complete_delivery(
        &self,
        route_id: Uuid,
        request_id: Uuid,
    ) -> Result<RouteCompletionResult, AppError> {
        let driver_id = self
            .directory
            .get_route(route_id)?
            .ok_or(AppError::RouteNotFound(route_id))?
            .driver_id;

        let _guard = self.lock_driver(driver_id).await;

        // Re-read under the lock: another completion may have landed first.
        let route = self
            .directory
            .get_route(route_id)?
            .ok_or(AppError::RouteNotFound(route_id))?;
        if route.status == RouteStatus::Completed {
            return Err(AppError::RouteAlreadyCompleted(route_id));
        }
        if !route.delivery_request_ids.contains(&request_id) {
            return Err(AppError::RequestNotInRoute {
                route_id,
                request_id,
            });
        }

        let driver = self.load_driver(driver_id)?;
        let request = self.load_request(request_id)?;

        let now = Utc::now();
        let mut updated_route = route.clone();
        updated_route.delivery_request_ids.remove(&request_id);
        let route_completed = updated_route.delivery_request_ids.is_empty();
        if route_completed {
            updated_route.status = RouteStatus::Completed;
            updated_route.actual_end_time = Some(now);
        }

        let (driver_status, driver_current_deliveries) = if route_completed {
            (DriverStatus::Available, 0)
        } else {
            (driver.status, driver.current_deliveries.saturating_sub(1))
        };

        let delivered = RequestAssignment {
            status: RequestStatus::Delivered,
            delivery_time: Some(now),
            ..request.assignment()
        };

        let mut saga = Saga::new(self.directory.as_ref());

        saga.step(
            "deliver_request",
            |directory| directory.update_request_status(request_id, delivered),
            |_| restore_request(&request),
        )?;
        saga.step(
            "update_route",
            |directory| directory.update_route(&updated_route),
            |_| restore_route(&route),
        )?;
        saga.step(
            "release_driver",
            |directory| {
                directory.update_driver_status(driver_id, driver_status, driver_current_deliveries)
            },
            |_| restore_driver(&driver),
        )?;

        saga.commit();

        if route_completed {
            info!(route_id = %route_id, driver_id = %driver_id, "route completed");
        } else {
            info!(
                route_id = %route_id,
                request_id = %request_id,
                remaining = updated_route.delivery_request_ids.len(),
                "delivery completed"
            );
        }

        let mut request = request;
        request.status = delivered.status;
        request.delivery_time = delivered.delivery_time;

        Ok(RouteCompletionResult {
            route: updated_route,
            request,
            route_completed,
            driver_status,
            driver_current_deliveries,
        })
    }

    /// Operator status change. A driver with an active route stays busy
    /// until the route completes, which releases the driver itself.
    pub async fn set_driver_status(
        &self,
        driver_id: Uuid,
        status: DriverStatus,
    ) -> Result<Driver, AppError> {
        let _guard = self.lock_driver(driver_id).await;

        let driver = self.load_driver(driver_id)?;
        if status == DriverStatus::Available
            && !self
                .directory
                .list_routes(driver_id, Some(RouteStatus::Active))?
                .is_empty()
        {
            return Err(AppError::DriverHasActiveRoute(driver_id));
        }

        self.directory
            .update_driver_status(driver_id, status, driver.current_deliveries)?;
        info!(driver_id = %driver_id, status = ?status, "driver status changed");

        self.load_driver(driver_id)
    }
}
