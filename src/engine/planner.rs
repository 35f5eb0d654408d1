//! Greedy multi-stop route construction.
//!
//! Every request becomes a pickup and a delivery stop. Stops are then taken
//! one at a time from the pool, always from the driver's current position:
//!
//! 1. pickups of requests already touched by the route, nearest first;
//! 2. otherwise the nearest priority stop;
//! 3. otherwise the nearest stop of any kind.
//!
//! A delivery chosen by rule 2 or 3 whose pickup is still in the pool is
//! replaced by that pickup, so a pickup always precedes its delivery.
//! Distance ties go to the stop that entered the pool first, which makes
//! the ordering deterministic for identical input.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, MissingCoordinates, MissingEnd};
use crate::geo::{estimate_travel_time, haversine_km};
use crate::models::driver::VehicleType;
use crate::models::request::DeliveryRequest;
use crate::models::route::PlannedRoute;
use crate::models::stop::{Coordinate, Stop, StopRole};

/// A plan together with the requests that had to be left out of it.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub route: PlannedRoute,
    pub warnings: Vec<MissingCoordinates>,
}

/// Candidate stops keyed by the order they entered the pool.
struct StopPool {
    stops: BTreeMap<usize, Stop>,
    pickups: HashMap<Uuid, usize>,
}

impl StopPool {
    fn new(stops: impl IntoIterator<Item = Stop>) -> Self {
        let mut pool = Self {
            stops: BTreeMap::new(),
            pickups: HashMap::new(),
        };

        for (key, stop) in stops.into_iter().enumerate() {
            if stop.is_pickup() {
                pool.pickups.insert(stop.request_id, key);
            }
            pool.stops.insert(key, stop);
        }

        pool
    }

    fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    fn nearest<F>(&self, from: &Coordinate, eligible: F) -> Option<usize>
    where
        F: Fn(&Stop) -> bool,
    {
        let mut best: Option<(usize, f64)> = None;

        for (&key, stop) in self.stops.iter().filter(|(_, stop)| eligible(stop)) {
            let distance = haversine_km(from, &stop.coordinate);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((key, distance)),
            }
        }

        best.map(|(key, _)| key)
    }

    /// Swaps a delivery for its own pickup while that pickup is still
    /// waiting in the pool.
    fn escorted(&self, key: usize) -> usize {
        match self.stops.get(&key) {
            Some(stop) if !stop.is_pickup() => self
                .pickups
                .get(&stop.request_id)
                .copied()
                .filter(|pickup| self.stops.contains_key(pickup))
                .unwrap_or(key),
            _ => key,
        }
    }

    fn take(&mut self, key: usize) -> Option<Stop> {
        self.stops.remove(&key)
    }
}

pub fn build_route(
    driver_position: Option<Coordinate>,
    requests: &[DeliveryRequest],
    vehicle: VehicleType,
) -> Result<PlanOutcome, AppError> {
    let start = driver_position.ok_or(AppError::MissingDriverPosition)?;
    if requests.is_empty() {
        return Err(AppError::NoRequestsSelected);
    }

    let mut warnings = Vec::new();
    let mut seen = HashSet::new();
    let mut request_ids = BTreeSet::new();
    let mut pickups = Vec::with_capacity(requests.len());
    let mut deliveries = Vec::with_capacity(requests.len());

    for request in requests.iter().filter(|request| seen.insert(request.id)) {
        let missing = match (request.pickup, request.delivery) {
            (Some(pickup), Some(delivery)) => {
                pickups.push(Stop::pickup(request.id, pickup, request.is_priority));
                deliveries.push(Stop::delivery(request.id, delivery, request.is_priority));
                request_ids.insert(request.id);
                continue;
            }
            (None, Some(_)) => MissingEnd::Pickup,
            (Some(_), None) => MissingEnd::Delivery,
            (None, None) => MissingEnd::Both,
        };

        warn!(request_id = %request.id, ?missing, "request excluded from plan: missing coordinates");
        warnings.push(MissingCoordinates {
            request_id: request.id,
            missing,
        });
    }

    let mut remaining = StopPool::new(pickups.into_iter().chain(deliveries));
    let mut ordered: Vec<Stop> = Vec::with_capacity(request_ids.len() * 2);
    let mut touched: HashSet<Uuid> = HashSet::new();
    let mut current = start;

    while !remaining.is_empty() {
        let next = remaining
            .nearest(&current, |stop| {
                stop.is_pickup() && touched.contains(&stop.request_id)
            })
            .or_else(|| {
                remaining
                    .nearest(&current, |stop| stop.is_priority)
                    .map(|key| remaining.escorted(key))
            })
            .or_else(|| {
                remaining
                    .nearest(&current, |_| true)
                    .map(|key| remaining.escorted(key))
            });

        let Some(stop) = next.and_then(|key| remaining.take(key)) else {
            break;
        };

        touched.insert(stop.request_id);
        current = stop.coordinate;
        ordered.push(stop);
    }

    let (total_distance_km, total_duration_seconds) = leg_totals(start, &ordered, vehicle);

    debug!(
        stops = ordered.len(),
        excluded = warnings.len(),
        distance_km = total_distance_km,
        duration_seconds = total_duration_seconds,
        "route planned"
    );

    Ok(PlanOutcome {
        route: PlannedRoute {
            ordered_stops: ordered,
            total_distance_km,
            total_duration_seconds,
            request_ids,
        },
        warnings,
    })
}

/// Distance and travel time over consecutive legs, starting at `start`.
pub fn leg_totals(start: Coordinate, stops: &[Stop], vehicle: VehicleType) -> (f64, f64) {
    let mut previous = start;
    let mut distance_km = 0.0;
    let mut duration_seconds = 0.0;

    for stop in stops {
        let leg = haversine_km(&previous, &stop.coordinate);
        distance_km += leg;
        duration_seconds += estimate_travel_time(leg, vehicle);
        previous = stop.coordinate;
    }

    (distance_km, duration_seconds)
}

/// Upper bound on the travel time a submitted plan may claim.
pub const MAX_ROUTE_SECONDS: f64 = 7.0 * 24.0 * 3600.0;

/// Checks that a plan handed back by a client still has the shape the
/// builder produces: exactly one pickup and one delivery per covered
/// request, pickup first, no foreign stops, and sane totals.
pub fn check_plan(planned: &PlannedRoute) -> Result<(), AppError> {
    if !planned.total_distance_km.is_finite() || planned.total_distance_km < 0.0 {
        return Err(invalid_plan(format!(
            "total distance {} km",
            planned.total_distance_km
        )));
    }
    if !planned.total_duration_seconds.is_finite()
        || planned.total_duration_seconds < 0.0
        || planned.total_duration_seconds > MAX_ROUTE_SECONDS
    {
        return Err(invalid_plan(format!(
            "total duration {} s",
            planned.total_duration_seconds
        )));
    }
    if planned.ordered_stops.len() != planned.request_ids.len() * 2 {
        return Err(invalid_plan(format!(
            "{} stops for {} requests",
            planned.ordered_stops.len(),
            planned.request_ids.len()
        )));
    }

    let mut picked_up = HashSet::new();
    let mut delivered = HashSet::new();
    for stop in &planned.ordered_stops {
        if !planned.request_ids.contains(&stop.request_id) {
            return Err(invalid_plan(format!(
                "stop for uncovered request {}",
                stop.request_id
            )));
        }
        if !stop.coordinate.latitude.is_finite() || !stop.coordinate.longitude.is_finite() {
            return Err(invalid_plan(format!(
                "non-finite coordinate for request {}",
                stop.request_id
            )));
        }
        let fresh = match stop.role {
            StopRole::Pickup => picked_up.insert(stop.request_id),
            StopRole::Delivery => {
                picked_up.contains(&stop.request_id) && delivered.insert(stop.request_id)
            }
        };
        if !fresh {
            return Err(invalid_plan(format!(
                "stops of request {} out of order",
                stop.request_id
            )));
        }
    }

    Ok(())
}

fn invalid_plan(reason: String) -> AppError {
    AppError::BadRequest(format!("invalid route plan: {reason}"))
}
