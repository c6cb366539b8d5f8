//! Account handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, CreateAccountRequest, ListAccountsQuery, ok,
};
use crate::ledger::Account;

/// Open a new account with a zero balance
///
/// POST /accounts
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Account> {
    let params = req.validate()?;
    let account = state.ledger.create_account(params).await?;
    tracing::info!(
        account_id = account.id,
        owner = %account.owner,
        currency = %account.currency,
        "Account created"
    );
    ok(account)
}

/// GET /accounts/{id}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Account> {
    if id < 1 {
        return ApiError::bad_request("id must be at least 1").into_err();
    }
    ok(state.ledger.get_account(id).await?)
}

/// Delete an account that no entry or transfer references
///
/// DELETE /accounts/{id}
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    if id < 1 {
        return ApiError::bad_request("id must be at least 1").into_err();
    }
    state.ledger.delete_account(id).await?;
    tracing::info!(account_id = id, "Account deleted");
    ok(())
}

/// GET /accounts?page_id=1&page_size=5
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListAccountsQuery>,
) -> ApiResult<Vec<Account>> {
    let params = query.validate()?;
    ok(state.ledger.list_accounts(params).await?)
}
