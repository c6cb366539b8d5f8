//! Account Ledger
//!
//! Accounts, their signed entries and the transfers between them, plus the
//! engine that moves money atomically.
//!
//! # Architecture
//!
//! ```text
//! Ledger (pool facade) ──▶ TransferEngine ──▶ TxExecutor (retry) ──▶ LedgerBackend
//!        │                                                           ├─ PgBackend ──▶ stores
//!        └──▶ AccountStore / EntryStore / TransferStore              └─ MemoryBackend
//! ```
//!
//! # Invariants
//!
//! 1. **Conservation**: a transfer of A writes exactly one `-A` entry and one
//!    `+A` entry, and moves both balances by the same amounts.
//! 2. **All-or-nothing**: the transfer row, both entries and both balance
//!    updates commit in one unit of work or not at all.
//! 3. **Lock order**: balance rows are updated in ascending account id.
//! 4. **Append-only**: entries and transfers are never updated or deleted.

pub mod backend;
pub mod engine;
pub mod error;
pub mod executor;
pub mod memory;
pub mod models;
pub mod pg;
pub mod retry;
pub mod service;
pub mod store;

pub use backend::{LedgerBackend, UnitOfWork};
pub use engine::TransferEngine;
pub use error::LedgerError;
pub use executor::TxExecutor;
pub use memory::{FaultOp, MemoryBackend};
pub use models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListAccountsParams, ListEntriesParams, ListTransfersParams,
    Transfer, TransferTxParams, TransferTxResult, UpdateAccountParams,
};
pub use pg::PgBackend;
pub use retry::RetryPolicy;
pub use service::Ledger;
pub use store::{AccountStore, EntryStore, TransferStore};
