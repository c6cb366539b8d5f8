//! Transfer handlers

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, TransferRequest, error_codes, ok};
use crate::ledger::{Account, TransferTxResult};

/// Move money between two accounts of the same currency
///
/// POST /transfers
///
/// Both accounts are looked up first so a missing account is a 404 and a
/// currency mismatch is a 400 before any unit of work begins.
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<TransferTxResult> {
    let params = req.validate()?;

    valid_account(&state, req.from_account_id, &req.currency).await?;
    valid_account(&state, req.to_account_id, &req.currency).await?;

    let result = state
        .ledger
        .transfer_tx_with_deadline(params, state.transfer_timeout)
        .await?;
    ok(result)
}

async fn valid_account(
    state: &AppState,
    account_id: i64,
    currency: &str,
) -> Result<Account, ApiError> {
    let account = state.ledger.get_account(account_id).await?;
    if account.currency != currency {
        return Err(currency_mismatch(&account, currency));
    }
    Ok(account)
}

fn currency_mismatch(account: &Account, currency: &str) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        error_codes::CURRENCY_MISMATCH,
        format!(
            "account [{}] currency mismatch: {} vs {}",
            account.id, account.currency, currency
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_currency_mismatch_error() {
        let account = Account {
            id: 7,
            owner: "bob".into(),
            balance: 0,
            currency: "EUR".into(),
            created_at: Utc::now(),
        };
        let err = currency_mismatch(&account, "USD");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, error_codes::CURRENCY_MISMATCH);
        assert!(err.msg.contains("EUR vs USD"));
    }
}
