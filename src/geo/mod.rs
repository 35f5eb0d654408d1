use crate::models::driver::VehicleType;
use crate::models::stop::Coordinate;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Flat allowance added to every leg for parking, handover and the like.
const HANDLING_MINUTES: f64 = 10.0;

pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Average speed in km/h. Vehicles without a profile travel at bike speed.
pub fn speed_kmh(vehicle: VehicleType) -> f64 {
    match vehicle {
        VehicleType::Bike | VehicleType::Other => 15.0,
        VehicleType::Scooter => 25.0,
        VehicleType::Car => 35.0,
        VehicleType::Walk => 5.0,
    }
}

/// Estimated seconds to cover `distance_km`, rounded up to whole minutes of
/// travel plus the per-leg handling allowance.
pub fn estimate_travel_time(distance_km: f64, vehicle: VehicleType) -> f64 {
    let travel_minutes = (distance_km.max(0.0) / speed_kmh(vehicle) * 60.0).ceil();
    (travel_minutes + HANDLING_MINUTES) * 60.0
}

#[cfg(test)]
mod tests {
    use super::{estimate_travel_time, haversine_km};
    use crate::models::driver::VehicleType;
    use crate::models::stop::Coordinate;

    #[test]
    fn zero_distance_for_same_point() {
        let p = Coordinate::new(36.8065, 10.1815);
        assert_eq!(haversine_km(&p, &p), 0.0);
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = Coordinate::new(51.5074, -0.1278);
        let paris = Coordinate::new(48.8566, 2.3522);
        let distance = haversine_km(&london, &paris);
        assert!((distance - 343.0).abs() < 5.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(36.80, 10.18);
        let b = Coordinate::new(36.86, 10.30);
        assert!((haversine_km(&a, &b) - haversine_km(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn bike_covers_15_km_in_an_hour_plus_handling() {
        assert_eq!(estimate_travel_time(15.0, VehicleType::Bike), 70.0 * 60.0);
    }

    #[test]
    fn partial_minutes_round_up() {
        // 1 km by car is 1.71 minutes of driving.
        assert_eq!(estimate_travel_time(1.0, VehicleType::Car), 12.0 * 60.0);
    }

    #[test]
    fn unknown_vehicle_uses_bike_speed() {
        assert_eq!(
            estimate_travel_time(7.3, VehicleType::Other),
            estimate_travel_time(7.3, VehicleType::Bike)
        );
    }

    #[test]
    fn faster_vehicles_arrive_sooner() {
        let walk = estimate_travel_time(10.0, VehicleType::Walk);
        let bike = estimate_travel_time(10.0, VehicleType::Bike);
        let car = estimate_travel_time(10.0, VehicleType::Car);
        assert!(walk > bike && bike > car);
    }
}
