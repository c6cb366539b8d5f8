//! Unit-of-work seam
//!
//! The orchestrator talks to the backing store only through these traits.
//! A [`UnitOfWork`] is one open transaction; its writes become visible to
//! other units on [`UnitOfWork::commit`] and are discarded on
//! [`UnitOfWork::rollback`] or when it is dropped unfinished.

use async_trait::async_trait;

use super::error::LedgerError;
use super::models::{
    Account, AddAccountBalanceParams, CreateEntryParams, CreateTransferParams, Entry, Transfer,
};

/// One atomic unit of work, exclusively owned by a single call.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Append a transfer row
    async fn create_transfer(&mut self, arg: CreateTransferParams)
    -> Result<Transfer, LedgerError>;

    /// Append an entry row
    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, LedgerError>;

    /// Atomic `balance = balance + amount`, taking the row lock until the
    /// unit finishes. Returns the post-increment row.
    async fn add_account_balance(
        &mut self,
        arg: AddAccountBalanceParams,
    ) -> Result<Account, LedgerError>;

    async fn commit(&mut self) -> Result<(), LedgerError>;

    async fn rollback(&mut self) -> Result<(), LedgerError>;
}

/// Source of units of work (a connection pool, or the in-memory store).
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Acquire a connection and open a unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, LedgerError>;
}
