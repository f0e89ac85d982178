use dashmap::mapref::entry::Entry;
use tracing::info;
use uuid::Uuid;

use crate::engine::fulfillment::advance_order;
use crate::error::AppError;
use crate::models::delivery::Delivery;
use crate::models::order::OrderStatus;
use crate::state::AppState;

/// Creates the delivery job for an order, or returns the existing one.
///
/// Idempotency hangs on the `delivery_by_order` index: the entry lock for
/// the order id is the single serialization point, so concurrent requests
/// for the same order can never insert two jobs.
pub fn request_delivery(
    state: &AppState,
    order_id: Uuid,
    pickup_location: String,
    dropoff_location: String,
) -> Result<Delivery, AppError> {
    if !state.orders.contains_key(&order_id) {
        return Err(AppError::NotFound(format!("order {} not found", order_id)));
    }

    let delivery = match state.delivery_by_order.entry(order_id) {
        Entry::Occupied(existing) => {
            let delivery_id = *existing.get();
            return state
                .deliveries
                .get(&delivery_id)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "delivery index points at missing delivery {}",
                        delivery_id
                    ))
                });
        }
        Entry::Vacant(slot) => {
            let delivery = Delivery::new(
                order_id,
                pickup_location,
                dropoff_location,
                state.delivery_fee,
            );
            state.deliveries.insert(delivery.id, delivery.clone());
            slot.insert(delivery.id);
            delivery
        }
    };

    advance_order(state, order_id, OrderStatus::Processing);

    state
        .metrics
        .delivery_transitions_total
        .with_label_values(&["searching"])
        .inc();
    state.metrics.jobs_searching.inc();
    state.publish_delivery(&delivery);

    info!(
        delivery_id = %delivery.id,
        order_id = %order_id,
        earnings = delivery.earnings,
        "delivery job created"
    );

    Ok(delivery)
}
