//! PostgreSQL stores for the three ledger tables.
//!
//! Stores are stateless: every function takes any sqlx executor, so the same
//! query runs against the pool for plain reads or against an open
//! transaction inside a unit of work.

mod accounts;
mod entries;
mod transfers;

pub use accounts::AccountStore;
pub use entries::EntryStore;
pub use transfers::TransferStore;
