//! Transfer Engine
//!
//! `transfer_tx` moves `amount` from one account to another as a single
//! unit of work:
//!
//! ```text
//! create transfer → entry(from, -amount) → entry(to, +amount)
//!                 → add_balance(lower id) → add_balance(higher id)
//! ```
//!
//! Balance rows are always locked in ascending id order, so two units moving
//! money in opposite directions between the same pair of accounts queue on
//! the same first row instead of deadlocking. Deadlocks that still happen
//! (e.g. with other writers) are retried by the executor.

use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::backend::{LedgerBackend, UnitOfWork};
use super::error::LedgerError;
use super::executor::TxExecutor;
use super::models::{
    Account, AddAccountBalanceParams, CreateEntryParams, CreateTransferParams, TransferTxParams,
    TransferTxResult,
};
use super::retry::RetryPolicy;

/// Orchestrates transfer transactions over a [`LedgerBackend`]
#[derive(Clone)]
pub struct TransferEngine {
    executor: TxExecutor,
}

impl TransferEngine {
    pub fn new(backend: Arc<dyn LedgerBackend>, policy: RetryPolicy) -> Self {
        Self {
            executor: TxExecutor::new(backend, policy),
        }
    }

    /// Perform a money transfer from one account to the other.
    ///
    /// Creates the transfer record, both entries and both balance updates
    /// in one unit of work. Validation failures never open a unit.
    pub async fn transfer_tx(&self, arg: TransferTxParams) -> Result<TransferTxResult, LedgerError> {
        arg.validate()?;

        let result = self
            .executor
            .run("transfer_tx", move |unit| transfer_steps(unit, arg).boxed())
            .await?;

        info!(
            transfer_id = result.transfer.id,
            from = arg.from_account_id,
            to = arg.to_account_id,
            amount = arg.amount,
            "Transfer committed"
        );
        Ok(result)
    }

    /// [`TransferEngine::transfer_tx`] bounded by `deadline`, retries
    /// included. On expiry the in-flight unit is dropped, which rolls it
    /// back, and `Cancelled` is returned.
    pub async fn transfer_tx_with_deadline(
        &self,
        arg: TransferTxParams,
        deadline: Duration,
    ) -> Result<TransferTxResult, LedgerError> {
        match tokio::time::timeout(deadline, self.transfer_tx(arg)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    from = arg.from_account_id,
                    to = arg.to_account_id,
                    amount = arg.amount,
                    deadline_ms = deadline.as_millis() as u64,
                    "Transfer cancelled at deadline"
                );
                Err(LedgerError::Cancelled(format!(
                    "transfer did not complete within {}ms",
                    deadline.as_millis()
                )))
            }
        }
    }
}

/// (lower id, higher id) in the order their rows must be locked
pub(crate) fn lock_order(
    (id1, amount1): (i64, i64),
    (id2, amount2): (i64, i64),
) -> ((i64, i64), (i64, i64)) {
    if id1 < id2 {
        ((id1, amount1), (id2, amount2))
    } else {
        ((id2, amount2), (id1, amount1))
    }
}

async fn transfer_steps(
    unit: &mut dyn UnitOfWork,
    arg: TransferTxParams,
) -> Result<TransferTxResult, LedgerError> {
    let transfer = unit
        .create_transfer(CreateTransferParams {
            from_account_id: arg.from_account_id,
            to_account_id: arg.to_account_id,
            amount: arg.amount,
        })
        .await?;

    let from_entry = unit
        .create_entry(CreateEntryParams {
            account_id: arg.from_account_id,
            amount: -arg.amount,
        })
        .await?;

    let to_entry = unit
        .create_entry(CreateEntryParams {
            account_id: arg.to_account_id,
            amount: arg.amount,
        })
        .await?;

    let (first, second) = lock_order(
        (arg.from_account_id, -arg.amount),
        (arg.to_account_id, arg.amount),
    );
    let (first, second) = add_money(unit, first, second).await?;
    let (from_account, to_account) = if first.id == arg.from_account_id {
        (first, second)
    } else {
        (second, first)
    };

    Ok(TransferTxResult {
        transfer,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}

async fn add_money(
    unit: &mut dyn UnitOfWork,
    (id1, amount1): (i64, i64),
    (id2, amount2): (i64, i64),
) -> Result<(Account, Account), LedgerError> {
    let account1 = unit
        .add_account_balance(AddAccountBalanceParams {
            id: id1,
            amount: amount1,
        })
        .await?;
    let account2 = unit
        .add_account_balance(AddAccountBalanceParams {
            id: id2,
            amount: amount2,
        })
        .await?;
    Ok((account1, account2))
}
