use std::sync::Arc;

use tokio::sync::broadcast;

use crate::engine::dispatch::Dispatcher;
use crate::models::route::RouteEvent;
use crate::observability::metrics::Metrics;
use crate::store::MemoryDirectory;

pub struct AppState {
    pub directory: Arc<MemoryDirectory>,
    pub dispatcher: Dispatcher,
    pub route_events_tx: broadcast::Sender<RouteEvent>,
    pub metrics: Metrics,
    pub default_max_concurrent_deliveries: u32,
}

impl AppState {
    pub fn new(event_buffer_size: usize, default_max_concurrent_deliveries: u32) -> Self {
        let directory = Arc::new(MemoryDirectory::new());
        let (route_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);
        let metrics = Metrics::new();
        let dispatcher = Dispatcher::new(
            directory.clone(),
            metrics.clone(),
            route_events_tx.clone(),
        );

        Self {
            directory,
            dispatcher,
            route_events_tx,
            metrics,
            default_max_concurrent_deliveries,
        }
    }
}
