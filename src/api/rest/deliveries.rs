use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::fulfillment::{confirm_delivery, confirm_pickup};
use crate::engine::matching::accept_delivery;
use crate::error::AppError;
use crate::models::delivery::Delivery;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/deliveries/:id", get(get_delivery))
        .route("/deliveries/:id/accept", post(accept))
        .route("/deliveries/:id/pickup", post(pickup))
        .route("/deliveries/:id/deliver", post(deliver))
}

#[derive(Deserialize)]
pub struct AcceptRequest {
    pub run_man_id: Uuid,
}

#[derive(Deserialize)]
pub struct DeliverRequest {
    pub proof_of_delivery: String,
}

async fn get_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Delivery>, AppError> {
    let delivery = state
        .deliveries
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("delivery {} not found", id)))?;

    Ok(Json(delivery.value().clone()))
}

async fn accept(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AcceptRequest>,
) -> Result<Json<Delivery>, AppError> {
    Ok(Json(accept_delivery(&state, id, payload.run_man_id)?))
}

async fn pickup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Delivery>, AppError> {
    Ok(Json(confirm_pickup(&state, id)?))
}

async fn deliver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeliverRequest>,
) -> Result<Json<Delivery>, AppError> {
    Ok(Json(confirm_delivery(&state, id, &payload.proof_of_delivery)?))
}
