use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::wallet::credit_earnings;
use crate::error::AppError;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::order::OrderStatus;
use crate::state::AppState;

/// Marks the job picked up and ships the linked order.
///
/// Retrying on an already picked-up job is a safe no-op; every other
/// out-of-order call is rejected without touching state.
pub fn confirm_pickup(state: &AppState, delivery_id: Uuid) -> Result<Delivery, AppError> {
    let snapshot = {
        let mut delivery = state.deliveries.get_mut(&delivery_id).ok_or_else(|| {
            AppError::NotFound(format!("delivery {} not found", delivery_id))
        })?;

        match delivery.status {
            DeliveryStatus::PickedUp => return Ok(delivery.clone()),
            DeliveryStatus::Assigned => {}
            other => {
                return Err(AppError::InvalidTransition(format!(
                    "cannot confirm pickup from {:?}",
                    other
                )))
            }
        }

        delivery.status = DeliveryStatus::PickedUp;
        delivery.updated_at = Utc::now();
        delivery.clone()
    };

    advance_order(state, snapshot.order_id, OrderStatus::Shipped);

    state
        .metrics
        .delivery_transitions_total
        .with_label_values(&["picked_up"])
        .inc();
    state.publish_delivery(&snapshot);

    info!(
        delivery_id = %delivery_id,
        order_id = %snapshot.order_id,
        "delivery picked up"
    );

    Ok(snapshot)
}

/// Closes out the job: records proof, delivers the linked order, and settles
/// the courier's earnings.
///
/// The wallet credit rides on the PickedUp -> Delivered flip under the entry
/// lock. A retry observes `Delivered`, returns the stored record, and never
/// reaches the credit, so settlement is exactly-once.
pub fn confirm_delivery(
    state: &AppState,
    delivery_id: Uuid,
    proof: &str,
) -> Result<Delivery, AppError> {
    let proof = proof.trim();
    if proof.is_empty() {
        return Err(AppError::Validation(
            "proof of delivery is required".to_string(),
        ));
    }

    let snapshot = {
        let mut delivery = state.deliveries.get_mut(&delivery_id).ok_or_else(|| {
            AppError::NotFound(format!("delivery {} not found", delivery_id))
        })?;

        match delivery.status {
            DeliveryStatus::Delivered => return Ok(delivery.clone()),
            DeliveryStatus::PickedUp => {}
            other => {
                return Err(AppError::InvalidTransition(format!(
                    "cannot confirm delivery from {:?}",
                    other
                )))
            }
        }

        delivery.status = DeliveryStatus::Delivered;
        delivery.proof_of_delivery = Some(proof.to_string());
        delivery.updated_at = Utc::now();
        delivery.clone()
    };

    advance_order(state, snapshot.order_id, OrderStatus::Delivered);

    if let Some(run_man_id) = snapshot.run_man_id {
        credit_earnings(state, run_man_id, snapshot.earnings);
    } else {
        warn!(delivery_id = %delivery_id, "delivered without an assigned courier; skipping settlement");
    }

    state
        .metrics
        .delivery_transitions_total
        .with_label_values(&["delivered"])
        .inc();
    state.publish_delivery(&snapshot);

    info!(
        delivery_id = %delivery_id,
        order_id = %snapshot.order_id,
        earnings = snapshot.earnings,
        "delivery completed"
    );

    Ok(snapshot)
}

/// Advances the linked order one step, respecting the forward-only path.
/// A repeat of the same target is silently absorbed so delivery retries
/// stay idempotent on the order side.
pub(crate) fn advance_order(state: &AppState, order_id: Uuid, target: OrderStatus) {
    let Some(mut order) = state.orders.get_mut(&order_id) else {
        warn!(order_id = %order_id, "linked order not found; skipping status sync");
        return;
    };

    if order.status == target {
        return;
    }

    if order.status.can_advance_to(target) {
        order.status = target;
    } else {
        warn!(
            order_id = %order_id,
            current = ?order.status,
            target = ?target,
            "refusing out-of-order order status change"
        );
    }
}
