//! PostgreSQL backend
//!
//! Each unit of work is one sqlx transaction on a pooled connection. The
//! transaction is configured before the first write and forwards every
//! ledger write to the stores, scoped to that transaction.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::backend::{LedgerBackend, UnitOfWork};
use super::error::LedgerError;
use super::models::{
    Account, AddAccountBalanceParams, CreateEntryParams, CreateTransferParams, Entry, Transfer,
};
use super::store::{AccountStore, EntryStore, TransferStore};
use crate::config::{DatabaseConfig, IsolationLevel};

/// Opens units of work on a PostgreSQL pool
#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
    isolation: IsolationLevel,
    statement_timeout_ms: Option<u64>,
    lock_timeout_ms: Option<u64>,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            isolation: IsolationLevel::default(),
            statement_timeout_ms: None,
            lock_timeout_ms: None,
        }
    }

    pub fn with_config(pool: PgPool, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            isolation: config.isolation,
            statement_timeout_ms: config.statement_timeout_ms,
            lock_timeout_ms: config.lock_timeout_ms,
        }
    }

    async fn configure(&self, tx: &mut Transaction<'static, Postgres>) -> Result<(), LedgerError> {
        // Must be the first statement of the transaction
        if self.isolation != IsolationLevel::ReadCommitted {
            let sql = format!("SET TRANSACTION ISOLATION LEVEL {}", self.isolation.as_sql());
            sqlx::query(&sql).execute(&mut **tx).await?;
        }
        if let Some(ms) = self.statement_timeout_ms {
            let sql = format!("SET LOCAL statement_timeout = {}", ms);
            sqlx::query(&sql).execute(&mut **tx).await?;
        }
        if let Some(ms) = self.lock_timeout_ms {
            let sql = format!("SET LOCAL lock_timeout = {}", ms);
            sqlx::query(&sql).execute(&mut **tx).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerBackend for PgBackend {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        // A failed SET leaves nothing to undo; dropping `tx` rolls it back
        self.configure(&mut tx).await?;
        Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
    }
}

/// Dropping an unfinished unit rolls the transaction back on its connection.
pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn tx(&mut self) -> Result<&mut Transaction<'static, Postgres>, LedgerError> {
        self.tx
            .as_mut()
            .ok_or_else(|| LedgerError::Database("unit of work already finished".to_string()))
    }

    fn take(&mut self) -> Result<Transaction<'static, Postgres>, LedgerError> {
        self.tx
            .take()
            .ok_or_else(|| LedgerError::Database("unit of work already finished".to_string()))
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn create_transfer(
        &mut self,
        arg: CreateTransferParams,
    ) -> Result<Transfer, LedgerError> {
        let tx = self.tx()?;
        TransferStore::create(&mut **tx, arg).await
    }

    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, LedgerError> {
        let tx = self.tx()?;
        EntryStore::create(&mut **tx, arg).await
    }

    async fn add_account_balance(
        &mut self,
        arg: AddAccountBalanceParams,
    ) -> Result<Account, LedgerError> {
        let tx = self.tx()?;
        AccountStore::add_balance(&mut **tx, arg).await
    }

    async fn commit(&mut self) -> Result<(), LedgerError> {
        self.take()?.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), LedgerError> {
        self.take()?.rollback().await?;
        Ok(())
    }
}
