use serde::Serialize;
use uuid::Uuid;

use crate::geo::{estimate_travel_time, haversine_km};
use crate::models::driver::{Driver, DriverStatus};
use crate::models::request::DeliveryRequest;

const DISTANCE_WEIGHT: f64 = 1.5;
const RATING_WEIGHT: f64 = 2.0;
const PRIORITY_RATING_WEIGHT: f64 = 3.0;
const EXPERIENCE_DIVISOR: f64 = 50.0;
const EXPERIENCE_CAP: f64 = 5.0;

#[derive(Debug, Clone, Serialize)]
pub struct DriverCandidate {
    pub driver_id: Uuid,
    pub name: String,
    /// Lower is better.
    pub score: f64,
    pub distance_to_pickup_km: f64,
    pub estimated_seconds: f64,
}

/// Scores one driver for a request, or `None` when the driver has no known
/// position or the request has no pickup.
pub fn score_driver(driver: &Driver, request: &DeliveryRequest) -> Option<DriverCandidate> {
    let position = driver.current_coordinate?;
    let pickup = request.pickup?;

    let distance_to_pickup_km = haversine_km(&position, &pickup);
    let trip_km = request
        .delivery
        .map(|delivery| haversine_km(&pickup, &delivery))
        .unwrap_or(0.0);

    let mut score = distance_to_pickup_km * DISTANCE_WEIGHT;
    score -= driver.average_rating * RATING_WEIGHT;
    score -= experience_bonus(driver.total_deliveries);
    if request.is_priority {
        score -= driver.average_rating * PRIORITY_RATING_WEIGHT;
    }

    Some(DriverCandidate {
        driver_id: driver.id,
        name: driver.name.clone(),
        score,
        distance_to_pickup_km,
        estimated_seconds: estimate_travel_time(
            distance_to_pickup_km + trip_km,
            driver.vehicle_type,
        ),
    })
}

fn experience_bonus(total_deliveries: u32) -> f64 {
    (total_deliveries as f64 / EXPERIENCE_DIVISOR).min(EXPERIENCE_CAP)
}

/// Available drivers with spare capacity, best first.
pub fn rank_drivers(drivers: &[Driver], request: &DeliveryRequest) -> Vec<DriverCandidate> {
    let mut candidates: Vec<DriverCandidate> = drivers
        .iter()
        .filter(|driver| driver.status == DriverStatus::Available && driver.remaining_capacity() > 0)
        .filter_map(|driver| score_driver(driver, request))
        .collect();

    candidates.sort_by(|a, b| a.score.total_cmp(&b.score));
    candidates
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{rank_drivers, score_driver};
    use crate::models::driver::{Driver, DriverStatus, VehicleType};
    use crate::models::request::{DeliveryRequest, RequestStatus};
    use crate::models::stop::Coordinate;

    fn driver(seed: u128, lat: f64, lng: f64, rating: f64, total: u32) -> Driver {
        Driver {
            id: Uuid::from_u128(seed),
            name: format!("driver-{seed}"),
            current_coordinate: Some(Coordinate::new(lat, lng)),
            vehicle_type: VehicleType::Bike,
            max_concurrent_deliveries: 5,
            current_deliveries: 0,
            status: DriverStatus::Available,
            average_rating: rating,
            total_deliveries: total,
            updated_at: Utc::now(),
        }
    }

    fn request(is_priority: bool) -> DeliveryRequest {
        DeliveryRequest {
            id: Uuid::new_v4(),
            status: RequestStatus::Pending,
            pickup: Some(Coordinate::new(36.8065, 10.1815)),
            pickup_address: String::new(),
            delivery: Some(Coordinate::new(36.8188, 10.1658)),
            delivery_address: String::new(),
            is_priority,
            distance_km: None,
            estimated_duration_seconds: None,
            assigned_driver_id: None,
            batch_id: None,
            accepted_at: None,
            delivery_time: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn closer_driver_scores_lower_when_other_factors_match() {
        let near = driver(1, 36.8066, 10.1816, 4.5, 100);
        let far = driver(2, 36.90, 10.30, 4.5, 100);

        let near_score = score_driver(&near, &request(false)).unwrap().score;
        let far_score = score_driver(&far, &request(false)).unwrap().score;

        assert!(near_score < far_score);
    }

    #[test]
    fn experience_bonus_is_capped() {
        let veteran = driver(1, 36.8066, 10.1816, 4.0, 250);
        let legend = driver(2, 36.8066, 10.1816, 4.0, 10_000);

        let a = score_driver(&veteran, &request(false)).unwrap().score;
        let b = score_driver(&legend, &request(false)).unwrap().score;

        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn priority_requests_favour_rating_over_distance() {
        // 2 km further away but a full star better.
        let close = driver(1, 36.8066, 10.1816, 3.5, 0);
        let rated = driver(2, 36.8245, 10.1815, 4.5, 0);

        let normal = rank_drivers(&[close.clone(), rated.clone()], &request(false));
        let priority = rank_drivers(&[close, rated], &request(true));

        assert_eq!(normal[0].driver_id, Uuid::from_u128(1));
        assert_eq!(priority[0].driver_id, Uuid::from_u128(2));
    }

    #[test]
    fn unavailable_full_or_unlocated_drivers_are_skipped() {
        let mut offline = driver(1, 36.8066, 10.1816, 5.0, 0);
        offline.status = DriverStatus::Offline;
        let mut full = driver(2, 36.8066, 10.1816, 5.0, 0);
        full.current_deliveries = 5;
        let mut lost = driver(3, 0.0, 0.0, 5.0, 0);
        lost.current_coordinate = None;
        let ok = driver(4, 36.8066, 10.1816, 1.0, 0);

        let ranked = rank_drivers(&[offline, full, lost, ok], &request(false));

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].driver_id, Uuid::from_u128(4));
    }
}
