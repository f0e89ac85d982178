use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::matching::{available_jobs, run_man_context, RunManContext};
use crate::engine::wallet::{cash_out, set_online};
use crate::error::AppError;
use crate::models::courier::RunManProfile;
use crate::models::delivery::Delivery;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/couriers", post(create_courier).get(list_couriers))
        .route("/couriers/:id/jobs", get(list_jobs))
        .route("/couriers/:id/context", get(get_context))
        .route("/couriers/:id/online", patch(update_online))
        .route("/couriers/:id/cashout", post(cashout))
}

#[derive(Deserialize)]
pub struct CreateCourierRequest {
    pub name: String,
    pub vehicle_type: String,
    pub vehicle_plate: String,
    pub phone: String,
}

#[derive(Deserialize)]
pub struct UpdateOnlineRequest {
    pub is_online: bool,
}

#[derive(Serialize)]
pub struct CashOutResponse {
    pub amount: f64,
}

async fn create_courier(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCourierRequest>,
) -> Result<Json<RunManProfile>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    if payload.vehicle_type.trim().is_empty() {
        return Err(AppError::Validation(
            "vehicle_type cannot be empty".to_string(),
        ));
    }

    let now = Utc::now();
    let courier = RunManProfile {
        id: Uuid::new_v4(),
        name: payload.name,
        vehicle_type: payload.vehicle_type,
        vehicle_plate: payload.vehicle_plate,
        phone: payload.phone,
        // New couriers start visible to the job board.
        is_online: true,
        wallet_balance: 0.0,
        created_at: now,
        updated_at: now,
    };

    state.couriers.insert(courier.id, courier.clone());
    Ok(Json(courier))
}

async fn list_couriers(State(state): State<Arc<AppState>>) -> Json<Vec<RunManProfile>> {
    let couriers = state
        .couriers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(couriers)
}

async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Delivery>>, AppError> {
    Ok(Json(available_jobs(&state, id)?))
}

async fn get_context(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunManContext>, AppError> {
    Ok(Json(run_man_context(&state, id)?))
}

async fn update_online(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOnlineRequest>,
) -> Result<Json<RunManProfile>, AppError> {
    Ok(Json(set_online(&state, id, payload.is_online)?))
}

async fn cashout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CashOutResponse>, AppError> {
    let amount = cash_out(&state, id)?;
    Ok(Json(CashOutResponse { amount }))
}
