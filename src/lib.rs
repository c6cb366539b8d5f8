//! Atomic Ledger - transactional money transfers over PostgreSQL
//!
//! # Modules
//!
//! - [`config`] - YAML configuration with environment overrides
//! - [`logging`] - tracing subscriber setup
//! - [`db`] - Connection pool and embedded migrations
//! - [`ledger`] - Account/Entry/Transfer stores and the transfer engine
//! - [`gateway`] - HTTP API

pub mod config;
pub mod db;
pub mod gateway;
pub mod ledger;
pub mod logging;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use db::Database;
pub use ledger::{
    Account, Entry, Ledger, LedgerError, Transfer, TransferEngine, TransferTxParams,
    TransferTxResult,
};
