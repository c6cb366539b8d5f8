//! Ledger facade over a PostgreSQL pool
//!
//! Plain lookups go straight to the stores on the pool; transfers go through
//! the [`TransferEngine`]. Nothing here is inherited from the stores: every
//! operation is forwarded explicitly.

use std::sync::Arc;
use std::time::Duration;

use super::engine::TransferEngine;
use super::error::LedgerError;
use super::models::{
    Account, CreateAccountParams, Entry, ListAccountsParams, ListEntriesParams,
    ListTransfersParams, Transfer, TransferTxParams, TransferTxResult, UpdateAccountParams,
    is_supported_currency,
};
use super::pg::PgBackend;
use super::retry::RetryPolicy;
use super::store::{AccountStore, EntryStore, TransferStore};
use crate::config::{DatabaseConfig, RetryConfig};
use crate::db::Database;

#[derive(Clone)]
pub struct Ledger {
    db: Database,
    engine: TransferEngine,
}

impl Ledger {
    pub fn new(db: Database, db_config: &DatabaseConfig, retry: &RetryConfig) -> Self {
        let backend = PgBackend::with_config(db.pool().clone(), db_config);
        let engine = TransferEngine::new(Arc::new(backend), RetryPolicy::from(retry));
        Self { db, engine }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn engine(&self) -> &TransferEngine {
        &self.engine
    }

    // === Accounts ===

    pub async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, LedgerError> {
        if !is_supported_currency(&arg.currency) {
            return Err(LedgerError::InvalidCurrency(arg.currency));
        }
        AccountStore::create(self.db.pool(), &arg).await
    }

    pub async fn get_account(&self, id: i64) -> Result<Account, LedgerError> {
        AccountStore::get(self.db.pool(), id).await
    }

    pub async fn list_accounts(&self, arg: ListAccountsParams) -> Result<Vec<Account>, LedgerError> {
        AccountStore::list(self.db.pool(), arg).await
    }

    pub async fn update_account(&self, arg: UpdateAccountParams) -> Result<Account, LedgerError> {
        AccountStore::update(self.db.pool(), arg).await
    }

    pub async fn delete_account(&self, id: i64) -> Result<(), LedgerError> {
        AccountStore::delete(self.db.pool(), id).await
    }

    // === Entries / Transfers (read-only) ===

    pub async fn get_entry(&self, id: i64) -> Result<Entry, LedgerError> {
        EntryStore::get(self.db.pool(), id).await
    }

    pub async fn list_entries(&self, arg: ListEntriesParams) -> Result<Vec<Entry>, LedgerError> {
        EntryStore::list(self.db.pool(), arg).await
    }

    pub async fn get_transfer(&self, id: i64) -> Result<Transfer, LedgerError> {
        TransferStore::get(self.db.pool(), id).await
    }

    pub async fn list_transfers(
        &self,
        arg: ListTransfersParams,
    ) -> Result<Vec<Transfer>, LedgerError> {
        TransferStore::list(self.db.pool(), arg).await
    }

    // === Transfer transaction ===

    pub async fn transfer_tx(&self, arg: TransferTxParams) -> Result<TransferTxResult, LedgerError> {
        self.engine.transfer_tx(arg).await
    }

    pub async fn transfer_tx_with_deadline(
        &self,
        arg: TransferTxParams,
        deadline: Duration,
    ) -> Result<TransferTxResult, LedgerError> {
        self.engine.transfer_tx_with_deadline(arg, deadline).await
    }
}
