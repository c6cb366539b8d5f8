use std::sync::Arc;
use std::time::Duration;

use crate::ledger::Ledger;

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    /// Deadline applied to each `POST /transfers`
    pub transfer_timeout: Duration,
}

impl AppState {
    pub fn new(ledger: Arc<Ledger>, transfer_timeout: Duration) -> Self {
        Self {
            ledger,
            transfer_timeout,
        }
    }
}
