use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::courier::RunManProfile;
use crate::models::delivery::Delivery;
use crate::models::order::Order;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub orders: DashMap<Uuid, Order>,
    pub deliveries: DashMap<Uuid, Delivery>,
    pub couriers: DashMap<Uuid, RunManProfile>,
    /// order_id -> delivery_id. The entry lock on this index is what makes
    /// delivery creation idempotent under concurrent requests.
    pub delivery_by_order: DashMap<Uuid, Uuid>,
    pub delivery_events_tx: broadcast::Sender<Delivery>,
    pub delivery_fee: f64,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(event_buffer_size: usize, delivery_fee: f64) -> Self {
        let (delivery_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            orders: DashMap::new(),
            deliveries: DashMap::new(),
            couriers: DashMap::new(),
            delivery_by_order: DashMap::new(),
            delivery_events_tx,
            delivery_fee,
            metrics: Metrics::new(),
        }
    }

    /// Best-effort fan-out of a delivery snapshot to websocket subscribers.
    /// A send error only means nobody is listening.
    pub fn publish_delivery(&self, delivery: &Delivery) {
        let _ = self.delivery_events_tx.send(delivery.clone());
    }
}
