use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum DeliveryStatus {
    Searching,
    Assigned,
    PickedUp,
    Delivered,
}

/// A courier fulfillment job, one per order. `run_man_id` is `None` exactly
/// while the job is `Searching` and never changes once set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: Uuid,
    pub order_id: Uuid,
    pub run_man_id: Option<Uuid>,
    pub status: DeliveryStatus,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub earnings: f64,
    pub proof_of_delivery: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    pub fn new(order_id: Uuid, pickup: String, dropoff: String, earnings: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id,
            run_man_id: None,
            status: DeliveryStatus::Searching,
            pickup_location: pickup,
            dropoff_location: dropoff,
            earnings,
            proof_of_delivery: None,
            created_at: now,
            updated_at: now,
        }
    }
}
