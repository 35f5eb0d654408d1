use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::route::{Route, RouteCompletionResult};
use crate::state::AppState;
use crate::store::Directory;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/routes/:id", get(get_route))
        .route("/routes/:id/deliveries/:request_id", post(mark_delivered))
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    let route = state
        .directory
        .get_route(id)?
        .ok_or(AppError::RouteNotFound(id))?;

    Ok(Json(route))
}

async fn mark_delivered(
    State(state): State<Arc<AppState>>,
    Path((route_id, request_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RouteCompletionResult>, AppError> {
    let result = state
        .dispatcher
        .mark_delivered(route_id, request_id)
        .await?;

    Ok(Json(result))
}
