//! Operator-facing operations: propose a route for a driver, confirm it,
//! and record deliveries along it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::lifecycle::RouteLifecycle;
use crate::engine::planner::{build_route, PlanOutcome};
use crate::engine::scoring::{rank_drivers, DriverCandidate};
use crate::error::AppError;
use crate::models::driver::{Driver, DriverStatus};
use crate::models::request::{DeliveryRequest, RequestStatus};
use crate::models::route::{PlannedRoute, Route, RouteCompletionResult, RouteEvent};
use crate::observability::metrics::Metrics;
use crate::store::Directory;

pub struct Dispatcher {
    directory: Arc<dyn Directory>,
    lifecycle: RouteLifecycle,
    metrics: Metrics,
    events_tx: broadcast::Sender<RouteEvent>,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<dyn Directory>,
        metrics: Metrics,
        events_tx: broadcast::Sender<RouteEvent>,
    ) -> Self {
        Self {
            lifecycle: RouteLifecycle::new(directory.clone()),
            directory,
            metrics,
            events_tx,
        }
    }

    fn load_driver(&self, driver_id: Uuid) -> Result<Driver, AppError> {
        self.directory
            .get_driver(driver_id)?
            .ok_or(AppError::DriverNotFound(driver_id))
    }

    fn load_selection(&self, selected: &[Uuid]) -> Result<Vec<DeliveryRequest>, AppError> {
        let mut seen = HashSet::new();
        selected
            .iter()
            .filter(|id| seen.insert(**id))
            .map(|&id| {
                let request = self
                    .directory
                    .get_request(id)?
                    .ok_or(AppError::RequestNotFound(id))?;
                if request.status != RequestStatus::Pending {
                    return Err(AppError::RequestNotPending(id));
                }
                Ok(request)
            })
            .collect()
    }

    /// Plans a route over the selected pending requests. Nothing is written;
    /// dropping the returned plan discards it.
    pub fn propose_route(
        &self,
        driver_id: Uuid,
        selected: &[Uuid],
    ) -> Result<PlanOutcome, AppError> {
        let result = self.plan(driver_id, selected);

        let outcome = match &result {
            Ok(plan) if plan.warnings.is_empty() => "success",
            Ok(_) => "partial",
            Err(_) => "error",
        };
        self.metrics
            .route_plans_total
            .with_label_values(&[outcome])
            .inc();

        result
    }

    fn plan(&self, driver_id: Uuid, selected: &[Uuid]) -> Result<PlanOutcome, AppError> {
        let driver = self.load_driver(driver_id)?;
        let requests = self.load_selection(selected)?;
        if requests.is_empty() {
            return Err(AppError::NoRequestsSelected);
        }

        let requested = u32::try_from(requests.len()).unwrap_or(u32::MAX);
        if driver.current_deliveries.saturating_add(requested) > driver.max_concurrent_deliveries {
            return Err(AppError::CapacityExceeded {
                driver_id,
                current: driver.current_deliveries,
                requested,
                max: driver.max_concurrent_deliveries,
            });
        }

        let start = Instant::now();
        let plan = build_route(driver.current_coordinate, &requests, driver.vehicle_type)?;
        self.metrics
            .route_planning_seconds
            .observe(start.elapsed().as_secs_f64());

        info!(
            driver_id = %driver_id,
            stops = plan.route.ordered_stops.len(),
            excluded = plan.warnings.len(),
            distance_km = plan.route.total_distance_km,
            duration_seconds = plan.route.total_duration_seconds,
            "route proposed"
        );

        Ok(plan)
    }

    pub async fn confirm_route(
        &self,
        driver_id: Uuid,
        planned: &PlannedRoute,
    ) -> Result<Route, AppError> {
        let result = self.lifecycle.create_route(driver_id, planned).await;

        match &result {
            Ok(route) => {
                self.metrics
                    .routes_total
                    .with_label_values(&["created"])
                    .inc();
                self.metrics.routes_active.inc();
                if let Ok(Some(driver)) = self.directory.get_driver(driver_id) {
                    self.metrics.set_driver_utilization(
                        &driver_id.to_string(),
                        driver.current_deliveries,
                        driver.max_concurrent_deliveries,
                    );
                }
                self.publish(RouteEvent::RouteCreated {
                    route_id: route.id,
                    driver_id,
                    request_ids: route.delivery_request_ids.clone(),
                });
            }
            Err(err) => {
                self.metrics
                    .routes_total
                    .with_label_values(&["rejected"])
                    .inc();
                warn!(driver_id = %driver_id, error = %err, "route not created");
            }
        }

        result
    }

    pub async fn set_driver_status(
        &self,
        driver_id: Uuid,
        status: DriverStatus,
    ) -> Result<Driver, AppError> {
        let driver = self.lifecycle.set_driver_status(driver_id, status).await?;
        self.metrics.set_driver_utilization(
            &driver_id.to_string(),
            driver.current_deliveries,
            driver.max_concurrent_deliveries,
        );
        Ok(driver)
    }

    pub async fn mark_delivered(
        &self,
        route_id: Uuid,
        request_id: Uuid,
    ) -> Result<RouteCompletionResult, AppError> {
        let result = self
            .lifecycle
            .complete_delivery(route_id, request_id)
            .await?;

        self.metrics.deliveries_completed_total.inc();
        let driver_id = result.route.driver_id;
        if let Ok(Some(driver)) = self.directory.get_driver(driver_id) {
            self.metrics.set_driver_utilization(
                &driver_id.to_string(),
                result.driver_current_deliveries,
                driver.max_concurrent_deliveries,
            );
        }

        self.publish(RouteEvent::DeliveryCompleted {
            route_id,
            request_id,
            remaining: result.route.delivery_request_ids.len(),
        });

        if let (true, Some(actual_end_time)) = (result.route_completed, result.route.actual_end_time) {
            self.metrics.routes_active.dec();
            self.publish(RouteEvent::RouteCompleted {
                route_id,
                driver_id,
                actual_end_time,
            });
        }

        Ok(result)
    }

    /// Ranks the available drivers for a single request.
    pub fn driver_candidates(&self, request_id: Uuid) -> Result<Vec<DriverCandidate>, AppError> {
        let request = self
            .directory
            .get_request(request_id)?
            .ok_or(AppError::RequestNotFound(request_id))?;
        let drivers = self.directory.list_drivers(Some(DriverStatus::Available))?;
        Ok(rank_drivers(&drivers, &request))
    }

    fn publish(&self, event: RouteEvent) {
        // No subscribers is fine.
        let _ = self.events_tx.send(event);
    }
}
