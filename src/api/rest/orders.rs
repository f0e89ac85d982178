use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::registry::request_delivery;
use crate::error::AppError;
use crate::models::delivery::Delivery;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/delivery", post(create_delivery_request))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub buyer_id: Uuid,
    pub total_amount: f64,
    pub payment_method: String,
    pub shipping_address: String,
}

#[derive(Deserialize)]
pub struct RequestDeliveryBody {
    pub pickup_location: String,
    pub dropoff_location: String,
}

/// Checkout stand-in. Payment itself happens elsewhere; only the method is
/// recorded here.
async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    if payload.total_amount <= 0.0 {
        return Err(AppError::Validation(
            "total_amount must be > 0".to_string(),
        ));
    }

    if payload.shipping_address.trim().is_empty() {
        return Err(AppError::Validation(
            "shipping_address cannot be empty".to_string(),
        ));
    }

    let order = Order {
        id: Uuid::new_v4(),
        buyer_id: payload.buyer_id,
        total_amount: payload.total_amount,
        status: OrderStatus::Pending,
        payment_method: payload.payment_method,
        shipping_address: payload.shipping_address,
        created_at: Utc::now(),
    };

    state.orders.insert(order.id, order.clone());
    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;

    Ok(Json(order.value().clone()))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let mut order = state
        .orders
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;

    if !order.status.can_advance_to(OrderStatus::Cancelled) {
        return Err(AppError::InvalidTransition(format!(
            "cannot cancel order from {:?}",
            order.status
        )));
    }

    order.status = OrderStatus::Cancelled;
    Ok(Json(order.clone()))
}

async fn create_delivery_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RequestDeliveryBody>,
) -> Result<Json<Delivery>, AppError> {
    if payload.pickup_location.trim().is_empty() {
        return Err(AppError::Validation(
            "pickup_location cannot be empty".to_string(),
        ));
    }

    if payload.dropoff_location.trim().is_empty() {
        return Err(AppError::Validation(
            "dropoff_location cannot be empty".to_string(),
        ));
    }

    let delivery = request_delivery(
        &state,
        id,
        payload.pickup_location,
        payload.dropoff_location,
    )?;

    Ok(Json(delivery))
}
