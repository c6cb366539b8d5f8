//! Transaction executor
//!
//! Owns the unit-of-work lifecycle: begin, run the caller's writes, then
//! commit or roll back as one outcome. Transient failures re-run the whole
//! unit under the [`RetryPolicy`]; nothing is compensated step by step.

use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::backend::{LedgerBackend, UnitOfWork};
use super::error::LedgerError;
use super::retry::RetryPolicy;

#[derive(Clone)]
pub struct TxExecutor {
    backend: Arc<dyn LedgerBackend>,
    policy: RetryPolicy,
}

impl TxExecutor {
    pub fn new(backend: Arc<dyn LedgerBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    /// Run `f` inside a unit of work, retrying the whole unit on transient
    /// failures. `f` is called once per attempt with a fresh unit.
    pub async fn run<T, F>(&self, op: &'static str, mut f: F) -> Result<T, LedgerError>
    where
        T: Send,
        F: for<'u> FnMut(&'u mut dyn UnitOfWork) -> BoxFuture<'u, Result<T, LedgerError>> + Send,
    {
        let mut attempt: u32 = 1;
        loop {
            match self.exec_tx(op, &mut f).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(op, attempt, "Unit of work succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if self.policy.should_retry(&err, attempt) => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        op,
                        attempt,
                        backend = self.backend.name(),
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying unit of work"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() || err.is_connection() {
                        error!(op, attempt, error = %err, "Unit of work failed, retries exhausted");
                    }
                    return Err(err);
                }
            }
        }
    }

    /// One attempt: begin, run, commit or roll back.
    async fn exec_tx<T, F>(&self, op: &'static str, f: &mut F) -> Result<T, LedgerError>
    where
        T: Send,
        F: for<'u> FnMut(&'u mut dyn UnitOfWork) -> BoxFuture<'u, Result<T, LedgerError>> + Send,
    {
        let mut unit = self.backend.begin().await?;

        let result = f(unit.as_mut()).await;

        match result {
            Ok(value) => {
                unit.commit().await?;
                debug!(op, backend = self.backend.name(), "Unit of work committed");
                Ok(value)
            }
            Err(err) => match unit.rollback().await {
                Ok(()) => Err(err),
                Err(rollback_err) => {
                    error!(
                        op,
                        error = %err,
                        rollback_error = %rollback_err,
                        "Rollback failed"
                    );
                    Err(LedgerError::RollbackFailed {
                        error: Box::new(err),
                        rollback: Box::new(rollback_err),
                    })
                }
            },
        }
    }
}
