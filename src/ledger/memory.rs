//! In-memory backend
//!
//! Implements the unit-of-work contract in process so the orchestrator can
//! be exercised without PostgreSQL:
//!
//! - every account row has a lock, taken by `add_account_balance` and held
//!   until the unit commits, rolls back or is dropped
//! - waiting on a row lock longer than `lock_timeout` fails the unit with
//!   [`LedgerError::Serialization`], the way PostgreSQL reports a deadlock
//! - writes are staged per unit and only become visible on commit
//! - ids come from per-table sequences, so rolled-back units burn ids
//! - faults can be injected per operation to test atomicity

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use super::backend::{LedgerBackend, UnitOfWork};
use super::error::LedgerError;
use super::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, Transfer,
};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Operation a fault can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOp {
    Begin,
    CreateTransfer,
    CreateEntry,
    AddAccountBalance,
    Commit,
    Rollback,
}

#[derive(Debug)]
struct Fault {
    op: FaultOp,
    /// Fire on the `skip + 1`-th matching call
    skip: usize,
    remaining: usize,
    error: LedgerError,
}

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<i64, Account>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
}

struct Inner {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<i64, Arc<RowLock<()>>>>,
    faults: Mutex<Vec<Fault>>,
    account_seq: AtomicI64,
    entry_seq: AtomicI64,
    transfer_seq: AtomicI64,
    begun: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
    lock_timeout: Duration,
}

// Poisoning only happens if a test panicked while holding the guard
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Inner {
    fn row_lock(&self, account_id: i64) -> Arc<RowLock<()>> {
        lock(&self.row_locks)
            .entry(account_id)
            .or_insert_with(|| Arc::new(RowLock::new(())))
            .clone()
    }

    fn take_fault(&self, op: FaultOp) -> Option<LedgerError> {
        let mut faults = lock(&self.faults);
        let idx = faults.iter().position(|f| f.op == op)?;
        let fault = &mut faults[idx];
        if fault.skip > 0 {
            fault.skip -= 1;
            return None;
        }
        fault.remaining -= 1;
        let error = fault.error.clone();
        if fault.remaining == 0 {
            faults.remove(idx);
        }
        Some(error)
    }

    fn account(&self, id: i64) -> Option<Account> {
        lock(&self.tables).accounts.get(&id).cloned()
    }
}

/// In-process ledger store with PostgreSQL-like locking
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(Tables::default()),
                row_locks: Mutex::new(HashMap::new()),
                faults: Mutex::new(Vec::new()),
                account_seq: AtomicI64::new(1),
                entry_seq: AtomicI64::new(1),
                transfer_seq: AtomicI64::new(1),
                begun: AtomicUsize::new(0),
                committed: AtomicUsize::new(0),
                rolled_back: AtomicUsize::new(0),
                lock_timeout,
            }),
        }
    }

    /// Fail the next `times` calls of `op` with `error`.
    pub fn inject_fault(&self, op: FaultOp, error: LedgerError, times: usize) {
        self.inject_fault_after(op, 0, error, times);
    }

    /// Let `skip` calls of `op` succeed, then fail the following `times`.
    pub fn inject_fault_after(&self, op: FaultOp, skip: usize, error: LedgerError, times: usize) {
        if times == 0 {
            return;
        }
        lock(&self.inner.faults).push(Fault {
            op,
            skip,
            remaining: times,
            error,
        });
    }

    pub fn create_account(&self, arg: CreateAccountParams) -> Result<Account, LedgerError> {
        let mut tables = lock(&self.inner.tables);
        if tables
            .accounts
            .values()
            .any(|a| a.owner == arg.owner && a.currency == arg.currency)
        {
            return Err(LedgerError::ConstraintViolation(format!(
                "account for {} in {} already exists",
                arg.owner, arg.currency
            )));
        }

        let account = Account {
            id: self.inner.account_seq.fetch_add(1, Ordering::SeqCst),
            owner: arg.owner,
            balance: arg.balance,
            currency: arg.currency,
            created_at: Utc::now(),
        };
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    /// Committed state of an account
    pub fn get_account(&self, id: i64) -> Result<Account, LedgerError> {
        self.inner
            .account(id)
            .ok_or_else(|| LedgerError::NotFound(format!("account {}", id)))
    }

    pub fn get_entry(&self, id: i64) -> Result<Entry, LedgerError> {
        lock(&self.inner.tables)
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("entry {}", id)))
    }

    pub fn get_transfer(&self, id: i64) -> Result<Transfer, LedgerError> {
        lock(&self.inner.tables)
            .transfers
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("transfer {}", id)))
    }

    /// Committed entries of one account, oldest first
    pub fn entries_for(&self, account_id: i64) -> Vec<Entry> {
        lock(&self.inner.tables)
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect()
    }

    /// Committed transfers, oldest first
    pub fn transfers(&self) -> Vec<Transfer> {
        lock(&self.inner.tables).transfers.clone()
    }

    pub fn entry_count(&self) -> usize {
        lock(&self.inner.tables).entries.len()
    }

    pub fn transfer_count(&self) -> usize {
        lock(&self.inner.tables).transfers.len()
    }

    /// Units opened so far, including failed attempts
    pub fn begun_count(&self) -> usize {
        self.inner.begun.load(Ordering::SeqCst)
    }

    pub fn committed_count(&self) -> usize {
        self.inner.committed.load(Ordering::SeqCst)
    }

    pub fn rolled_back_count(&self) -> usize {
        self.inner.rolled_back.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, LedgerError> {
        if let Some(err) = self.inner.take_fault(FaultOp::Begin) {
            return Err(err);
        }
        self.inner.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryUnit {
            inner: self.inner.clone(),
            transfers: Vec::new(),
            entries: Vec::new(),
            deltas: BTreeMap::new(),
            row_guards: HashMap::new(),
            finished: false,
        }))
    }
}

/// Staged writes of one unit plus the row locks it holds
struct MemoryUnit {
    inner: Arc<Inner>,
    transfers: Vec<Transfer>,
    entries: Vec<Entry>,
    deltas: BTreeMap<i64, i64>,
    row_guards: HashMap<i64, OwnedMutexGuard<()>>,
    finished: bool,
}

impl MemoryUnit {
    fn ensure_open(&self) -> Result<(), LedgerError> {
        if self.finished {
            return Err(LedgerError::Database(
                "unit of work already finished".to_string(),
            ));
        }
        Ok(())
    }

    fn require_account(&self, id: i64) -> Result<Account, LedgerError> {
        self.inner.account(id).ok_or_else(|| {
            LedgerError::NotFound(format!("account {} referenced by ledger row", id))
        })
    }

    async fn lock_row(&mut self, account_id: i64) -> Result<(), LedgerError> {
        if self.row_guards.contains_key(&account_id) {
            return Ok(());
        }
        let row = self.inner.row_lock(account_id);
        match tokio::time::timeout(self.inner.lock_timeout, row.lock_owned()).await {
            Ok(guard) => {
                self.row_guards.insert(account_id, guard);
                Ok(())
            }
            Err(_) => Err(LedgerError::Serialization(format!(
                "deadlock detected: timed out waiting for row lock on account {}",
                account_id
            ))),
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.transfers.clear();
        self.entries.clear();
        self.deltas.clear();
        self.row_guards.clear();
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
    async fn create_transfer(
        &mut self,
        arg: CreateTransferParams,
    ) -> Result<Transfer, LedgerError> {
        self.ensure_open()?;
        if let Some(err) = self.inner.take_fault(FaultOp::CreateTransfer) {
            return Err(err);
        }
        if arg.amount <= 0 {
            return Err(LedgerError::ConstraintViolation(format!(
                "transfer amount must be positive, got {}",
                arg.amount
            )));
        }
        self.require_account(arg.from_account_id)?;
        self.require_account(arg.to_account_id)?;

        let transfer = Transfer {
            id: self.inner.transfer_seq.fetch_add(1, Ordering::SeqCst),
            from_account_id: arg.from_account_id,
            to_account_id: arg.to_account_id,
            amount: arg.amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, LedgerError> {
        self.ensure_open()?;
        if let Some(err) = self.inner.take_fault(FaultOp::CreateEntry) {
            return Err(err);
        }
        self.require_account(arg.account_id)?;

        let entry = Entry {
            id: self.inner.entry_seq.fetch_add(1, Ordering::SeqCst),
            account_id: arg.account_id,
            amount: arg.amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn add_account_balance(
        &mut self,
        arg: AddAccountBalanceParams,
    ) -> Result<Account, LedgerError> {
        self.ensure_open()?;
        if let Some(err) = self.inner.take_fault(FaultOp::AddAccountBalance) {
            return Err(err);
        }
        if self.inner.account(arg.id).is_none() {
            return Err(LedgerError::NotFound(format!("account {}", arg.id)));
        }

        self.lock_row(arg.id).await?;

        // Read under the row lock: the previous holder may have committed
        // a new balance while we waited.
        let mut account = self.require_account(arg.id)?;

        let staged = self.deltas.get(&arg.id).copied().unwrap_or(0);
        let delta = staged.checked_add(arg.amount).ok_or_else(|| {
            LedgerError::ConstraintViolation(format!("balance of account {} out of range", arg.id))
        })?;
        account.balance = account.balance.checked_add(delta).ok_or_else(|| {
            LedgerError::ConstraintViolation(format!("balance of account {} out of range", arg.id))
        })?;

        self.deltas.insert(arg.id, delta);
        Ok(account)
    }

    async fn commit(&mut self) -> Result<(), LedgerError> {
        self.ensure_open()?;
        if let Some(err) = self.inner.take_fault(FaultOp::Commit) {
            self.finish();
            return Err(err);
        }

        {
            let mut tables = lock(&self.inner.tables);
            for (id, delta) in &self.deltas {
                if let Some(account) = tables.accounts.get_mut(id) {
                    account.balance += delta;
                }
            }
            tables.entries.append(&mut self.entries);
            tables.transfers.append(&mut self.transfers);
        }

        self.inner.committed.fetch_add(1, Ordering::SeqCst);
        self.finish();
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), LedgerError> {
        self.ensure_open()?;
        // Staged writes are discarded even when the rollback "fails"
        self.finish();
        if let Some(err) = self.inner.take_fault(FaultOp::Rollback) {
            return Err(err);
        }
        self.inner.rolled_back.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(backend: &MemoryBackend, owner: &str, balance: i64) -> Account {
        backend
            .create_account(CreateAccountParams {
                owner: owner.to_string(),
                currency: "USD".to_string(),
                balance,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_staged_writes_invisible_until_commit() {
        let backend = MemoryBackend::new();
        let a = account(&backend, "alice", 100);

        let mut unit = backend.begin().await.unwrap();
        unit.create_entry(CreateEntryParams {
            account_id: a.id,
            amount: 5,
        })
        .await
        .unwrap();
        let updated = unit
            .add_account_balance(AddAccountBalanceParams { id: a.id, amount: 5 })
            .await
            .unwrap();
        assert_eq!(updated.balance, 105);

        assert_eq!(backend.get_account(a.id).unwrap().balance, 100);
        assert_eq!(backend.entry_count(), 0);

        unit.commit().await.unwrap();
        assert_eq!(backend.get_account(a.id).unwrap().balance, 105);
        assert_eq!(backend.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard() {
        let backend = MemoryBackend::new();
        let a = account(&backend, "alice", 100);

        let mut unit = backend.begin().await.unwrap();
        unit.add_account_balance(AddAccountBalanceParams { id: a.id, amount: -40 })
            .await
            .unwrap();
        unit.rollback().await.unwrap();

        {
            let mut dropped = backend.begin().await.unwrap();
            dropped
                .add_account_balance(AddAccountBalanceParams { id: a.id, amount: -40 })
                .await
                .unwrap();
        }

        assert_eq!(backend.get_account(a.id).unwrap().balance, 100);
        assert_eq!(backend.rolled_back_count(), 1);

        // Row lock released by both paths
        let mut unit = backend.begin().await.unwrap();
        unit.add_account_balance(AddAccountBalanceParams { id: a.id, amount: 1 })
            .await
            .unwrap();
        unit.commit().await.unwrap();
        assert_eq!(backend.get_account(a.id).unwrap().balance, 101);
    }

    #[tokio::test]
    async fn test_missing_account_is_not_found() {
        let backend = MemoryBackend::new();
        let a = account(&backend, "alice", 100);

        let mut unit = backend.begin().await.unwrap();
        let err = unit
            .create_transfer(CreateTransferParams {
                from_account_id: 999,
                to_account_id: a.id,
                amount: 10,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        let err = unit
            .add_account_balance(AddAccountBalanceParams { id: 999, amount: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_owner_currency_rejected() {
        let backend = MemoryBackend::new();
        account(&backend, "alice", 0);
        let err = backend
            .create_account(CreateAccountParams {
                owner: "alice".to_string(),
                currency: "USD".to_string(),
                balance: 0,
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::ConstraintViolation(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_not_lost() {
        let backend = MemoryBackend::with_lock_timeout(Duration::from_secs(10));
        let id = account(&backend, "alice", 1000).id;
        let m: i64 = 50;

        let mut handles = Vec::new();
        for _ in 0..m {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                let mut unit = backend.begin().await?;
                unit.add_account_balance(AddAccountBalanceParams { id, amount: 1 })
                    .await?;
                unit.commit().await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(backend.get_account(id).unwrap().balance, 1000 + m);
    }

    #[tokio::test]
    async fn test_lock_wait_timeout_reported_as_deadlock() {
        let backend = MemoryBackend::with_lock_timeout(Duration::from_millis(20));
        let a = account(&backend, "alice", 100);

        let mut holder = backend.begin().await.unwrap();
        holder
            .add_account_balance(AddAccountBalanceParams { id: a.id, amount: 1 })
            .await
            .unwrap();

        let mut waiter = backend.begin().await.unwrap();
        let err = waiter
            .add_account_balance(AddAccountBalanceParams { id: a.id, amount: 1 })
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_fault_skip_and_expiry() {
        let backend = MemoryBackend::new();
        let a = account(&backend, "alice", 100);
        backend.inject_fault_after(
            FaultOp::CreateEntry,
            1,
            LedgerError::Database("disk full".into()),
            1,
        );

        let mut unit = backend.begin().await.unwrap();
        let entry = CreateEntryParams {
            account_id: a.id,
            amount: 1,
        };
        assert!(unit.create_entry(entry).await.is_ok());
        assert!(unit.create_entry(entry).await.is_err());
        assert!(unit.create_entry(entry).await.is_ok());
    }

    #[tokio::test]
    async fn test_finished_unit_rejects_writes() {
        let backend = MemoryBackend::new();
        let a = account(&backend, "alice", 100);

        let mut unit = backend.begin().await.unwrap();
        unit.commit().await.unwrap();
        let err = unit
            .create_entry(CreateEntryParams {
                account_id: a.id,
                amount: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Database(_)));
    }
}
