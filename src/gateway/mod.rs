//! HTTP Gateway
//!
//! Thin axum surface over the [`Ledger`](crate::ledger::Ledger):
//!
//! | Method | Path             | Handler                         |
//! |--------|------------------|---------------------------------|
//! | GET    | `/health`        | [`handlers::health_check`]      |
//! | POST   | `/accounts`      | [`handlers::create_account`]    |
//! | GET    | `/accounts`      | [`handlers::list_accounts`]     |
//! | GET    | `/accounts/{id}` | [`handlers::get_account`]       |
//! | DELETE | `/accounts/{id}` | [`handlers::delete_account`]    |
//! | POST   | `/transfers`     | [`handlers::create_transfer`]   |

pub mod handlers;
pub mod state;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;

use state::AppState;

/// Build the gateway router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/accounts",
            post(handlers::create_account).get(handlers::list_accounts),
        )
        .route(
            "/accounts/{id}",
            get(handlers::get_account).delete(handlers::delete_account),
        )
        .route("/transfers", post(handlers::create_transfer))
        .with_state(state)
}

/// Start HTTP Gateway server and serve until Ctrl-C
pub async fn run_server(address: &str, state: Arc<AppState>) -> Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;

    tracing::info!(address, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Gateway server error")?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
