//! HTTP handlers
//!
//! Handlers validate input, call the [`Ledger`](crate::ledger::Ledger) and
//! wrap the result in the `ApiResponse` envelope. Ledger errors convert into
//! `ApiError` through `?`.

pub mod account;
pub mod health;
pub mod transfer;

pub use account::{create_account, delete_account, get_account, list_accounts};
pub use health::health_check;
pub use transfer::create_transfer;
