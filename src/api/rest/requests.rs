use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::scoring::DriverCandidate;
use crate::error::AppError;
use crate::geo::{estimate_travel_time, haversine_km};
use crate::models::driver::VehicleType;
use crate::models::request::{DeliveryRequest, PendingFilter, RequestStatus};
use crate::models::stop::Coordinate;
use crate::state::AppState;
use crate::store::Directory;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/requests", post(create_request))
        .route("/requests/pending", get(list_pending))
        .route("/requests/:id", get(get_request))
        .route("/requests/:id/driver-candidates", get(driver_candidates))
}

#[derive(Deserialize)]
pub struct CreateDeliveryRequest {
    pub pickup: Option<Coordinate>,
    #[serde(default)]
    pub pickup_address: String,
    pub delivery: Option<Coordinate>,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub is_priority: bool,
}

async fn create_request(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDeliveryRequest>,
) -> Result<Json<DeliveryRequest>, AppError> {
    let distance_km = payload
        .pickup
        .zip(payload.delivery)
        .map(|(pickup, delivery)| haversine_km(&pickup, &delivery));

    let request = DeliveryRequest {
        id: Uuid::new_v4(),
        status: RequestStatus::Pending,
        pickup: payload.pickup,
        pickup_address: payload.pickup_address,
        delivery: payload.delivery,
        delivery_address: payload.delivery_address,
        is_priority: payload.is_priority,
        distance_km,
        estimated_duration_seconds: distance_km
            .map(|distance| estimate_travel_time(distance, VehicleType::Bike)),
        assigned_driver_id: None,
        batch_id: None,
        accepted_at: None,
        delivery_time: None,
        created_at: Utc::now(),
    };

    state.directory.insert_request(request.clone());
    Ok(Json(request))
}

async fn list_pending(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<PendingFilter>,
) -> Result<Json<Vec<DeliveryRequest>>, AppError> {
    Ok(Json(state.directory.list_pending_requests(&filter)?))
}

async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeliveryRequest>, AppError> {
    let request = state
        .directory
        .get_request(id)?
        .ok_or(AppError::RequestNotFound(id))?;

    Ok(Json(request))
}

async fn driver_candidates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DriverCandidate>>, AppError> {
    Ok(Json(state.dispatcher.driver_candidates(id)?))
}
