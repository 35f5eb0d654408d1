//! The directory owns drivers and delivery requests and stores routes.
//! The dispatch core only reads through it and issues update commands.

pub mod memory;

use thiserror::Error;
use uuid::Uuid;

use crate::models::driver::{Driver, DriverStatus};
use crate::models::request::{DeliveryRequest, PendingFilter, RequestAssignment};
use crate::models::route::{Route, RouteDraft, RouteStatus};

pub use memory::MemoryDirectory;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("{entity} {id} does not exist")]
    Missing { entity: &'static str, id: Uuid },

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

pub trait Directory: Send + Sync {
    fn get_driver(&self, id: Uuid) -> Result<Option<Driver>, StoreError>;

    fn list_drivers(&self, status: Option<DriverStatus>) -> Result<Vec<Driver>, StoreError>;

    fn get_request(&self, id: Uuid) -> Result<Option<DeliveryRequest>, StoreError>;

    fn list_pending_requests(
        &self,
        filter: &PendingFilter,
    ) -> Result<Vec<DeliveryRequest>, StoreError>;

    fn get_route(&self, id: Uuid) -> Result<Option<Route>, StoreError>;

    fn list_routes(
        &self,
        driver_id: Uuid,
        status: Option<RouteStatus>,
    ) -> Result<Vec<Route>, StoreError>;

    /// Persists a new route and returns it with its assigned id.
    fn save_route(&self, draft: RouteDraft) -> Result<Route, StoreError>;

    fn update_route(&self, route: &Route) -> Result<(), StoreError>;

    fn delete_route(&self, id: Uuid) -> Result<(), StoreError>;

    fn update_request_status(
        &self,
        id: Uuid,
        assignment: RequestAssignment,
    ) -> Result<(), StoreError>;

    fn update_driver_status(
        &self,
        id: Uuid,
        status: DriverStatus,
        current_deliveries: u32,
    ) -> Result<(), StoreError>;
}
