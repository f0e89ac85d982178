use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::courier::RunManProfile;
use crate::state::AppState;

/// Settlement step, invoked only from the delivery completion transition.
/// The increment runs under the courier's entry lock, so it cannot lose an
/// update to a concurrent cash-out.
pub(crate) fn credit_earnings(state: &AppState, courier_id: Uuid, amount: f64) {
    let Some(mut courier) = state.couriers.get_mut(&courier_id) else {
        warn!(courier_id = %courier_id, "settlement target not found; earnings dropped");
        return;
    };

    courier.wallet_balance += amount;
    courier.updated_at = Utc::now();
    let balance = courier.wallet_balance;
    drop(courier);

    state.metrics.settled_earnings_total.inc_by(amount);
    state
        .metrics
        .courier_wallet_balance
        .with_label_values(&[&courier_id.to_string()])
        .set(balance);

    info!(
        courier_id = %courier_id,
        amount,
        balance,
        "earnings settled"
    );
}

pub fn set_online(
    state: &AppState,
    courier_id: Uuid,
    is_online: bool,
) -> Result<RunManProfile, AppError> {
    let mut courier = state.couriers.get_mut(&courier_id).ok_or_else(|| {
        AppError::NotFound(format!("courier {} not found", courier_id))
    })?;

    courier.is_online = is_online;
    courier.updated_at = Utc::now();

    Ok(courier.clone())
}

/// Drains the wallet and returns the withdrawn amount. The actual funds
/// transfer is an external collaborator; here only the ledger moves.
pub fn cash_out(state: &AppState, courier_id: Uuid) -> Result<f64, AppError> {
    let amount = {
        let mut courier = state.couriers.get_mut(&courier_id).ok_or_else(|| {
            AppError::NotFound(format!("courier {} not found", courier_id))
        })?;

        if courier.wallet_balance <= 0.0 {
            return Err(AppError::InsufficientFunds);
        }

        let amount = courier.wallet_balance;
        courier.wallet_balance = 0.0;
        courier.updated_at = Utc::now();
        amount
    };

    state
        .metrics
        .courier_wallet_balance
        .with_label_values(&[&courier_id.to_string()])
        .set(0.0);

    info!(courier_id = %courier_id, amount, "wallet cashed out");

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{cash_out, credit_earnings, set_online};
    use crate::error::AppError;
    use crate::models::courier::RunManProfile;
    use crate::state::AppState;

    fn state_with_courier(balance: f64) -> (AppState, Uuid) {
        let state = AppState::new(16, 10.0);
        let now = Utc::now();
        let courier_id = Uuid::new_v4();
        state.couriers.insert(
            courier_id,
            RunManProfile {
                id: courier_id,
                name: "C1".to_string(),
                vehicle_type: "bicycle".to_string(),
                vehicle_plate: "BZ-9000".to_string(),
                phone: "501-555-0101".to_string(),
                is_online: true,
                wallet_balance: balance,
                created_at: now,
                updated_at: now,
            },
        );
        (state, courier_id)
    }

    #[test]
    fn credits_accumulate() {
        let (state, courier_id) = state_with_courier(0.0);

        credit_earnings(&state, courier_id, 10.0);
        credit_earnings(&state, courier_id, 10.0);

        assert_eq!(state.couriers.get(&courier_id).unwrap().wallet_balance, 20.0);
    }

    #[test]
    fn cash_out_drains_the_balance_once() {
        let (state, courier_id) = state_with_courier(30.0);

        let amount = cash_out(&state, courier_id).unwrap();
        assert_eq!(amount, 30.0);
        assert_eq!(state.couriers.get(&courier_id).unwrap().wallet_balance, 0.0);

        let again = cash_out(&state, courier_id);
        assert!(matches!(again, Err(AppError::InsufficientFunds)));
    }

    #[test]
    fn cash_out_on_empty_wallet_is_rejected() {
        let (state, courier_id) = state_with_courier(0.0);

        let result = cash_out(&state, courier_id);

        assert!(matches!(result, Err(AppError::InsufficientFunds)));
        assert_eq!(state.couriers.get(&courier_id).unwrap().wallet_balance, 0.0);
    }

    #[test]
    fn online_flag_toggles() {
        let (state, courier_id) = state_with_courier(0.0);

        let profile = set_online(&state, courier_id, false).unwrap();
        assert!(!profile.is_online);

        let profile = set_online(&state, courier_id, true).unwrap();
        assert!(profile.is_online);
    }
}
