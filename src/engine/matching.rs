use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::courier::RunManProfile;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::state::AppState;

/// Everything the courier app renders in one fetch: the profile, the job in
/// flight (at most one), the open job board, and recent completions.
#[derive(Debug, Clone, Serialize)]
pub struct RunManContext {
    pub profile: RunManProfile,
    pub active_delivery: Option<Delivery>,
    pub available_jobs: Vec<Delivery>,
    pub completed_deliveries: Vec<Delivery>,
}

const COMPLETED_HISTORY_LIMIT: usize = 20;

/// Unclaimed jobs, newest first. An offline courier always sees an empty
/// board; going offline is how a courier stops receiving work.
pub fn available_jobs(state: &AppState, courier_id: Uuid) -> Result<Vec<Delivery>, AppError> {
    let is_online = state
        .couriers
        .get(&courier_id)
        .map(|entry| entry.is_online)
        .ok_or_else(|| AppError::NotFound(format!("courier {} not found", courier_id)))?;

    if !is_online {
        return Ok(Vec::new());
    }

    let mut jobs: Vec<Delivery> = state
        .deliveries
        .iter()
        .filter(|entry| entry.status == DeliveryStatus::Searching)
        .map(|entry| entry.value().clone())
        .collect();

    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(jobs)
}

pub fn run_man_context(state: &AppState, courier_id: Uuid) -> Result<RunManContext, AppError> {
    let profile = state
        .couriers
        .get(&courier_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("courier {} not found", courier_id)))?;

    let active_delivery = state
        .deliveries
        .iter()
        .find(|entry| {
            entry.run_man_id == Some(courier_id)
                && matches!(
                    entry.status,
                    DeliveryStatus::Assigned | DeliveryStatus::PickedUp
                )
        })
        .map(|entry| entry.value().clone());

    let mut completed_deliveries: Vec<Delivery> = state
        .deliveries
        .iter()
        .filter(|entry| {
            entry.run_man_id == Some(courier_id) && entry.status == DeliveryStatus::Delivered
        })
        .map(|entry| entry.value().clone())
        .collect();
    completed_deliveries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    completed_deliveries.truncate(COMPLETED_HISTORY_LIMIT);

    let available_jobs = available_jobs(state, courier_id)?;

    Ok(RunManContext {
        profile,
        active_delivery,
        available_jobs,
        completed_deliveries,
    })
}

/// First courier to claim a `Searching` job wins. The check and the write
/// happen under the delivery's entry lock, so concurrent claims can never
/// both succeed; losers observe the job as taken.
pub fn accept_delivery(
    state: &AppState,
    delivery_id: Uuid,
    courier_id: Uuid,
) -> Result<Delivery, AppError> {
    if !state.couriers.contains_key(&courier_id) {
        return Err(AppError::NotFound(format!(
            "courier {} not found",
            courier_id
        )));
    }

    let snapshot = {
        let mut delivery = state.deliveries.get_mut(&delivery_id).ok_or_else(|| {
            AppError::NotFound(format!("delivery {} not found", delivery_id))
        })?;

        if delivery.status != DeliveryStatus::Searching {
            state
                .metrics
                .accept_attempts_total
                .with_label_values(&["conflict"])
                .inc();
            return Err(AppError::AlreadyAssigned);
        }

        delivery.status = DeliveryStatus::Assigned;
        delivery.run_man_id = Some(courier_id);
        delivery.updated_at = Utc::now();
        delivery.clone()
    };

    state
        .metrics
        .accept_attempts_total
        .with_label_values(&["success"])
        .inc();
    state
        .metrics
        .delivery_transitions_total
        .with_label_values(&["assigned"])
        .inc();
    state.metrics.jobs_searching.dec();
    state.publish_delivery(&snapshot);

    info!(
        delivery_id = %delivery_id,
        courier_id = %courier_id,
        "delivery claimed"
    );

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::{accept_delivery, available_jobs};
    use crate::error::AppError;
    use crate::models::courier::RunManProfile;
    use crate::models::delivery::{Delivery, DeliveryStatus};
    use crate::state::AppState;

    fn run_man(id_seed: u128, is_online: bool) -> RunManProfile {
        let now = Utc::now();
        RunManProfile {
            id: Uuid::from_u128(id_seed),
            name: "test-courier".to_string(),
            vehicle_type: "motorbike".to_string(),
            vehicle_plate: "BZ-1234".to_string(),
            phone: "501-555-0100".to_string(),
            is_online,
            wallet_balance: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    fn searching_job(state: &AppState) -> Delivery {
        let delivery = Delivery::new(
            Uuid::new_v4(),
            "Store A".to_string(),
            "123 Palm Ave".to_string(),
            10.0,
        );
        state.deliveries.insert(delivery.id, delivery.clone());
        delivery
    }

    #[test]
    fn offline_courier_sees_no_jobs() {
        let state = AppState::new(16, 10.0);
        let courier = run_man(1, false);
        state.couriers.insert(courier.id, courier.clone());
        searching_job(&state);

        let jobs = available_jobs(&state, courier.id).unwrap();

        assert!(jobs.is_empty());
    }

    #[test]
    fn online_courier_sees_searching_jobs_newest_first() {
        let state = AppState::new(16, 10.0);
        let courier = run_man(1, true);
        state.couriers.insert(courier.id, courier.clone());

        let older = searching_job(&state);
        let mut newer = searching_job(&state);
        newer.created_at = older.created_at + Duration::seconds(60);
        state.deliveries.insert(newer.id, newer.clone());

        let jobs = available_jobs(&state, courier.id).unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, newer.id);
        assert_eq!(jobs[1].id, older.id);
    }

    #[test]
    fn claimed_jobs_leave_the_board() {
        let state = AppState::new(16, 10.0);
        let courier = run_man(1, true);
        state.couriers.insert(courier.id, courier.clone());
        let job = searching_job(&state);

        accept_delivery(&state, job.id, courier.id).unwrap();

        assert!(available_jobs(&state, courier.id).unwrap().is_empty());
    }

    #[test]
    fn second_claim_fails_with_already_assigned() {
        let state = AppState::new(16, 10.0);
        let winner = run_man(1, true);
        let loser = run_man(2, true);
        state.couriers.insert(winner.id, winner.clone());
        state.couriers.insert(loser.id, loser.clone());
        let job = searching_job(&state);

        let claimed = accept_delivery(&state, job.id, winner.id).unwrap();
        assert_eq!(claimed.status, DeliveryStatus::Assigned);
        assert_eq!(claimed.run_man_id, Some(winner.id));

        let result = accept_delivery(&state, job.id, loser.id);
        assert!(matches!(result, Err(AppError::AlreadyAssigned)));

        let stored = state.deliveries.get(&job.id).unwrap();
        assert_eq!(stored.run_man_id, Some(winner.id));
    }

    #[test]
    fn concurrent_claims_produce_exactly_one_winner() {
        let state = Arc::new(AppState::new(16, 10.0));
        let job = searching_job(&state);

        let couriers: Vec<Uuid> = (1..=8)
            .map(|seed| {
                let courier = run_man(seed, true);
                state.couriers.insert(courier.id, courier.clone());
                courier.id
            })
            .collect();

        let handles: Vec<_> = couriers
            .into_iter()
            .map(|courier_id| {
                let state = state.clone();
                std::thread::spawn(move || accept_delivery(&state, job.id, courier_id))
            })
            .collect();

        let mut wins = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(_) => wins += 1,
                Err(AppError::AlreadyAssigned) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(conflicts, 7);

        let stored = state.deliveries.get(&job.id).unwrap();
        assert_eq!(stored.status, DeliveryStatus::Assigned);
        assert!(stored.run_man_id.is_some());
    }
}
