//! Request bodies and query strings
//!
//! Each type validates itself into ledger parameters so handlers never see
//! raw client input.

use serde::Deserialize;

use super::response::ApiError;
use crate::ledger::models::{
    CreateAccountParams, ListAccountsParams, TransferTxParams, is_supported_currency,
};

pub const MIN_PAGE_SIZE: i64 = 5;
pub const MAX_PAGE_SIZE: i64 = 10;

fn check_currency(currency: &str) -> Result<(), ApiError> {
    if is_supported_currency(currency) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "Unsupported currency: {}",
            currency
        )))
    }
}

/// POST /accounts
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub owner: String,
    pub currency: String,
}

impl CreateAccountRequest {
    /// New accounts always open with a zero balance.
    pub fn validate(self) -> Result<CreateAccountParams, ApiError> {
        if self.owner.trim().is_empty() {
            return Err(ApiError::bad_request("owner must not be empty"));
        }
        check_currency(&self.currency)?;
        Ok(CreateAccountParams {
            owner: self.owner,
            currency: self.currency,
            balance: 0,
        })
    }
}

/// GET /accounts?page_id=1&page_size=5
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListAccountsQuery {
    pub page_id: i64,
    pub page_size: i64,
}

impl ListAccountsQuery {
    pub fn validate(self) -> Result<ListAccountsParams, ApiError> {
        if self.page_id < 1 {
            return Err(ApiError::bad_request("page_id must be at least 1"));
        }
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ApiError::bad_request(format!(
                "page_size must be between {} and {}",
                MIN_PAGE_SIZE, MAX_PAGE_SIZE
            )));
        }
        let offset = (self.page_id - 1)
            .checked_mul(self.page_size)
            .ok_or_else(|| ApiError::bad_request("page_id out of range"))?;
        Ok(ListAccountsParams {
            limit: self.page_size,
            offset,
        })
    }
}

/// POST /transfers
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub currency: String,
}

impl TransferRequest {
    pub fn validate(&self) -> Result<TransferTxParams, ApiError> {
        check_currency(&self.currency)?;
        let params = TransferTxParams::new(self.from_account_id, self.to_account_id, self.amount);
        params.validate()?;
        Ok(params)
    }
}
