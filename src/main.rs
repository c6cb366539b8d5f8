//! Atomic Ledger server
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│ Postgres │───▶│  Ledger  │───▶│ Gateway  │
//! │  (YAML)  │    │ (migrate)│    │ (engine) │    │  (axum)  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```
//!
//! Usage: `atomic_ledger [--env dev]`

use std::sync::Arc;

use anyhow::{Context, Result};

use atomic_ledger::config::AppConfig;
use atomic_ledger::db::Database;
use atomic_ledger::gateway::{self, state::AppState};
use atomic_ledger::ledger::Ledger;
use atomic_ledger::logging::init_logging;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == "--env")
        .and_then(|i| args.get(i + 1))
        .cloned()
        .unwrap_or_else(|| "dev".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env)?;
    let _log_guard = init_logging(&config)?;

    tracing::info!(env = %env, "Starting atomic ledger");

    let db = Database::connect(&config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;
    db.migrate().await.context("Failed to apply migrations")?;

    let ledger = Ledger::new(db.clone(), &config.database, &config.retry);
    let state = Arc::new(AppState::new(
        Arc::new(ledger),
        config.gateway.transfer_timeout(),
    ));

    let result = gateway::run_server(&config.gateway.address(), state).await;

    db.close().await;
    result
}
