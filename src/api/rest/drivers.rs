use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::planner::PlanOutcome;
use crate::error::AppError;
use crate::models::driver::{Driver, DriverStatus, VehicleType};
use crate::models::route::{PlannedRoute, Route, RouteStatus};
use crate::models::stop::Coordinate;
use crate::state::AppState;
use crate::store::Directory;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/:id/status", patch(update_driver_status))
        .route("/drivers/:id/location", patch(update_driver_location))
        .route("/drivers/:id/route-proposals", post(propose_route))
        .route("/drivers/:id/routes", get(list_driver_routes).post(confirm_route))
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    pub location: Option<Coordinate>,
    #[serde(default)]
    pub vehicle_type: VehicleType,
    pub max_concurrent_deliveries: Option<u32>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_deliveries: u32,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: DriverStatus,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: Coordinate,
}

#[derive(Deserialize)]
pub struct RoutesQuery {
    pub status: Option<RouteStatus>,
}

#[derive(Deserialize)]
pub struct ProposeRouteRequest {
    pub request_ids: Vec<Uuid>,
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    let max_concurrent_deliveries = payload
        .max_concurrent_deliveries
        .unwrap_or(state.default_max_concurrent_deliveries);
    if max_concurrent_deliveries == 0 {
        return Err(AppError::BadRequest(
            "max_concurrent_deliveries must be > 0".to_string(),
        ));
    }

    let driver = Driver {
        id: Uuid::new_v4(),
        name: payload.name,
        current_coordinate: payload.location,
        vehicle_type: payload.vehicle_type,
        max_concurrent_deliveries,
        current_deliveries: 0,
        status: DriverStatus::Available,
        average_rating: payload.average_rating.clamp(0.0, 5.0),
        total_deliveries: payload.total_deliveries,
        updated_at: Utc::now(),
    };

    state.directory.insert_driver(driver.clone());
    Ok(Json(driver))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Driver>>, AppError> {
    Ok(Json(state.directory.list_drivers(None)?))
}

async fn update_driver_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Driver>, AppError> {
    let driver = state.dispatcher.set_driver_status(id, payload.status).await?;

    Ok(Json(driver))
}

async fn update_driver_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Driver>, AppError> {
    let driver = state
        .directory
        .set_driver_location(id, payload.location)
        .map_err(|_| AppError::DriverNotFound(id))?;

    Ok(Json(driver))
}

async fn list_driver_routes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<RoutesQuery>,
) -> Result<Json<Vec<Route>>, AppError> {
    if state.directory.get_driver(id)?.is_none() {
        return Err(AppError::DriverNotFound(id));
    }

    Ok(Json(state.directory.list_routes(id, query.status)?))
}

async fn propose_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProposeRouteRequest>,
) -> Result<Json<PlanOutcome>, AppError> {
    let plan = state.dispatcher.propose_route(id, &payload.request_ids)?;
    Ok(Json(plan))
}

async fn confirm_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(planned): Json<PlannedRoute>,
) -> Result<Json<Route>, AppError> {
    let route = state.dispatcher.confirm_route(id, &planned).await?;
    Ok(Json(route))
}
