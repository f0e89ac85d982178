use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Courier ("run man") profile. The wallet balance only grows through
/// settlement and only resets through an explicit cash-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManProfile {
    pub id: Uuid,
    pub name: String,
    pub vehicle_type: String,
    pub vehicle_plate: String,
    pub phone: String,
    pub is_online: bool,
    pub wallet_balance: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
