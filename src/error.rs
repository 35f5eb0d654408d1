use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::driver::DriverStatus;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("cannot plan: driver location unknown")]
    MissingDriverPosition,

    #[error("no delivery requests selected")]
    NoRequestsSelected,

    #[error(
        "cannot assign: driver {driver_id} at capacity ({current} current + {requested} requested > {max})"
    )]
    CapacityExceeded {
        driver_id: Uuid,
        current: u32,
        requested: u32,
        max: u32,
    },

    #[error("cannot assign: driver {driver_id} is {status:?}")]
    DriverUnavailable { driver_id: Uuid, status: DriverStatus },

    #[error("driver {0} not found")]
    DriverNotFound(Uuid),

    #[error("delivery request {0} not found")]
    RequestNotFound(Uuid),

    #[error("delivery request {0} is no longer pending")]
    RequestNotPending(Uuid),

    #[error("route {0} not found")]
    RouteNotFound(Uuid),

    #[error("delivery request {request_id} is not part of route {route_id}")]
    RequestNotInRoute { route_id: Uuid, request_id: Uuid },

    #[error("route {0} is already completed")]
    RouteAlreadyCompleted(Uuid),

    #[error("driver {0} still has an active route")]
    DriverHasActiveRoute(Uuid),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::DriverNotFound(_)
            | AppError::RequestNotFound(_)
            | AppError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            AppError::CapacityExceeded { .. }
            | AppError::DriverUnavailable { .. }
            | AppError::RequestNotPending(_)
            | AppError::RequestNotInRoute { .. }
            | AppError::RouteAlreadyCompleted(_)
            | AppError::DriverHasActiveRoute(_) => StatusCode::CONFLICT,
            AppError::MissingDriverPosition => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NoRequestsSelected | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Persistence(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

/// Which coordinates a request is missing.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingEnd {
    Pickup,
    Delivery,
    Both,
}

/// Raised per request during planning. The request is left out of the
/// plan and the rest of the selection is still planned.
#[derive(Debug, Clone, Error, Serialize, PartialEq)]
#[error("delivery request {request_id} is missing {missing:?} coordinates")]
pub struct MissingCoordinates {
    pub request_id: Uuid,
    pub missing: MissingEnd,
}
