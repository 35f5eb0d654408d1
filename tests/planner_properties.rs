//! Property tests for the stop-ordering planner.
//!
//! # Invariants tested
//!
//! - **Precedence:** every pickup comes before its own delivery.
//! - **Completeness:** exactly one pickup and one delivery per planned
//!   request, nothing else.
//! - **Determinism:** identical input gives an identical plan.
//! - **Distance:** the total equals the sum of the legs from the driver.

use std::collections::HashMap;

use chrono::Utc;
use proptest::prelude::*;
use route_dispatch::engine::planner::build_route;
use route_dispatch::geo::haversine_km;
use route_dispatch::models::driver::VehicleType;
use route_dispatch::models::request::{DeliveryRequest, RequestStatus};
use route_dispatch::models::stop::{Coordinate, StopRole};
use uuid::Uuid;

fn coordinate() -> impl Strategy<Value = Coordinate> {
    (36.70f64..36.95, 10.05f64..10.35).prop_map(|(lat, lng)| Coordinate::new(lat, lng))
}

fn request_batch() -> impl Strategy<Value = Vec<DeliveryRequest>> {
    prop::collection::vec((coordinate(), coordinate(), any::<bool>()), 1..8).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (pickup, delivery, is_priority))| DeliveryRequest {
                id: Uuid::from_u128(i as u128 + 1),
                status: RequestStatus::Pending,
                pickup: Some(pickup),
                pickup_address: String::new(),
                delivery: Some(delivery),
                delivery_address: String::new(),
                is_priority,
                distance_km: None,
                estimated_duration_seconds: None,
                assigned_driver_id: None,
                batch_id: None,
                accepted_at: None,
                delivery_time: None,
                created_at: Utc::now(),
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn pickups_precede_deliveries(start in coordinate(), requests in request_batch()) {
        let plan = build_route(Some(start), &requests, VehicleType::Bike).unwrap();

        let mut seen: HashMap<Uuid, (Option<usize>, Option<usize>)> = HashMap::new();
        for (index, stop) in plan.route.ordered_stops.iter().enumerate() {
            let slot = seen.entry(stop.request_id).or_default();
            match stop.role {
                StopRole::Pickup => {
                    prop_assert!(slot.0.is_none(), "pickup visited twice");
                    slot.0 = Some(index);
                }
                StopRole::Delivery => {
                    prop_assert!(slot.1.is_none(), "delivery visited twice");
                    slot.1 = Some(index);
                }
            }
        }

        for request in &requests {
            let (pickup, delivery) = seen[&request.id];
            prop_assert!(pickup.unwrap() < delivery.unwrap());
        }
    }

    #[test]
    fn every_request_contributes_exactly_two_stops(start in coordinate(), requests in request_batch()) {
        let plan = build_route(Some(start), &requests, VehicleType::Car).unwrap();

        prop_assert_eq!(plan.route.ordered_stops.len(), requests.len() * 2);
        prop_assert_eq!(plan.route.request_ids.len(), requests.len());
        prop_assert!(plan.warnings.is_empty());
    }

    #[test]
    fn planning_is_deterministic(start in coordinate(), requests in request_batch()) {
        let first = build_route(Some(start), &requests, VehicleType::Scooter).unwrap();
        let second = build_route(Some(start), &requests, VehicleType::Scooter).unwrap();

        prop_assert_eq!(first.route, second.route);
    }

    #[test]
    fn total_distance_is_the_sum_of_legs(start in coordinate(), requests in request_batch()) {
        let plan = build_route(Some(start), &requests, VehicleType::Bike).unwrap();

        let mut previous = start;
        let mut expected = 0.0;
        for stop in &plan.route.ordered_stops {
            expected += haversine_km(&previous, &stop.coordinate);
            previous = stop.coordinate;
        }

        prop_assert!(plan.route.total_distance_km >= 0.0);
        prop_assert!((plan.route.total_distance_km - expected).abs() < 1e-9);
    }
}
