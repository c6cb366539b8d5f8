//! Shared fixtures for the integration tests
#![allow(dead_code)]

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;

use atomic_ledger::ledger::models::SUPPORTED_CURRENCIES;
use atomic_ledger::ledger::{Account, CreateAccountParams, MemoryBackend};

/// Random integer in `[min, max]`
pub fn random_int(min: i64, max: i64) -> i64 {
    rand::thread_rng().gen_range(min..=max)
}

/// Random lowercase owner name
pub fn random_owner() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect()
}

pub fn random_money() -> i64 {
    random_int(0, 1000)
}

pub fn random_currency() -> String {
    SUPPORTED_CURRENCIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("USD")
        .to_string()
}

pub fn account_params(currency: &str, balance: i64) -> CreateAccountParams {
    CreateAccountParams {
        owner: random_owner(),
        currency: currency.to_string(),
        balance,
    }
}

/// Open a USD account with `balance` on an in-memory ledger
pub fn open_memory_account(backend: &MemoryBackend, balance: i64) -> Account {
    backend
        .create_account(account_params("USD", balance))
        .expect("create account")
}
