//! Ledger Error Types
//!
//! Every storage failure is classified once, at the sqlx boundary, so the
//! retry policy and the gateway only ever match on [`LedgerError`].

use thiserror::Error;

/// Ledger error types
#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    // === Validation Errors (never reach storage) ===
    #[error("Amount must be greater than zero, got {0}")]
    InvalidAmount(i64),

    #[error("Source and destination account cannot be the same: {0}")]
    SameAccount(i64),

    #[error("Invalid account id: {0}")]
    InvalidAccountId(i64),

    #[error("Unsupported currency: {0}")]
    InvalidCurrency(String),

    // === Storage Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Serialization failure, deadlock or lock wait timeout
    #[error("Serialization failure: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("tx err: {error}, rollback err: {rollback}")]
    RollbackFailed {
        error: Box<LedgerError>,
        rollback: Box<LedgerError>,
    },
}

impl LedgerError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount(_) => "INVALID_AMOUNT",
            LedgerError::SameAccount(_) => "SAME_ACCOUNT",
            LedgerError::InvalidAccountId(_) => "INVALID_ACCOUNT_ID",
            LedgerError::InvalidCurrency(_) => "INVALID_CURRENCY",
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            LedgerError::Serialization(_) => "SERIALIZATION_FAILURE",
            LedgerError::Connection(_) => "CONNECTION_ERROR",
            LedgerError::Cancelled(_) => "CANCELLED",
            LedgerError::Database(_) => "DATABASE_ERROR",
            LedgerError::RollbackFailed { .. } => "ROLLBACK_FAILED",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::InvalidAmount(_)
            | LedgerError::SameAccount(_)
            | LedgerError::InvalidAccountId(_)
            | LedgerError::InvalidCurrency(_) => 400,
            LedgerError::NotFound(_) => 404,
            LedgerError::ConstraintViolation(_) | LedgerError::Serialization(_) => 409,
            LedgerError::Connection(_) => 503,
            LedgerError::Cancelled(_) => 504,
            LedgerError::Database(_) | LedgerError::RollbackFailed { .. } => 500,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount(_)
                | LedgerError::SameAccount(_)
                | LedgerError::InvalidAccountId(_)
                | LedgerError::InvalidCurrency(_)
        )
    }

    /// Contention between concurrent units; re-running the unit can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Serialization(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, LedgerError::Connection(_))
    }
}

// PostgreSQL SQLSTATE codes
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";
const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";
const NOT_NULL_VIOLATION: &str = "23502";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const QUERY_CANCELED: &str = "57014";
const ADMIN_SHUTDOWN: &str = "57P01";
const TOO_MANY_CONNECTIONS: &str = "53300";

/// Map a SQLSTATE to its ledger classification.
fn classify_sqlstate(code: &str, message: String) -> LedgerError {
    match code {
        SERIALIZATION_FAILURE | DEADLOCK_DETECTED | LOCK_NOT_AVAILABLE => {
            LedgerError::Serialization(message)
        }
        UNIQUE_VIOLATION | CHECK_VIOLATION | NOT_NULL_VIOLATION => {
            LedgerError::ConstraintViolation(message)
        }
        // Inserts only reference accounts, so a dangling reference means the
        // account does not exist.
        FOREIGN_KEY_VIOLATION => LedgerError::NotFound(message),
        QUERY_CANCELED => LedgerError::Cancelled(message),
        ADMIN_SHUTDOWN | TOO_MANY_CONNECTIONS => LedgerError::Connection(message),
        c if c.starts_with("08") => LedgerError::Connection(message),
        _ => LedgerError::Database(message),
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code() {
                    Some(code) => classify_sqlstate(&code, message),
                    None => LedgerError::Database(message),
                }
            }
            sqlx::Error::RowNotFound => LedgerError::NotFound("no rows in result set".to_string()),
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => LedgerError::Connection(e.to_string()),
            other => LedgerError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::SameAccount(1).code(), "SAME_ACCOUNT");
        assert_eq!(LedgerError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(
            LedgerError::Serialization("x".into()).code(),
            "SERIALIZATION_FAILURE"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(LedgerError::InvalidAmount(0).http_status(), 400);
        assert_eq!(LedgerError::NotFound("x".into()).http_status(), 404);
        assert_eq!(LedgerError::ConstraintViolation("x".into()).http_status(), 409);
        assert_eq!(LedgerError::Connection("x".into()).http_status(), 503);
        assert_eq!(LedgerError::Database("x".into()).http_status(), 500);
    }

    #[test]
    fn test_sqlstate_classification() {
        let msg = || "boom".to_string();
        assert!(classify_sqlstate("40001", msg()).is_transient());
        assert!(classify_sqlstate("40P01", msg()).is_transient());
        assert!(classify_sqlstate("55P03", msg()).is_transient());
        assert!(matches!(
            classify_sqlstate("23505", msg()),
            LedgerError::ConstraintViolation(_)
        ));
        assert!(matches!(
            classify_sqlstate("23503", msg()),
            LedgerError::NotFound(_)
        ));
        assert!(matches!(
            classify_sqlstate("57014", msg()),
            LedgerError::Cancelled(_)
        ));
        assert!(classify_sqlstate("08006", msg()).is_connection());
        assert!(classify_sqlstate("53300", msg()).is_connection());
        assert!(matches!(
            classify_sqlstate("42P01", msg()),
            LedgerError::Database(_)
        ));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        assert!(matches!(
            LedgerError::from(sqlx::Error::RowNotFound),
            LedgerError::NotFound(_)
        ));
        assert!(LedgerError::from(sqlx::Error::PoolTimedOut).is_connection());
        assert!(LedgerError::from(sqlx::Error::PoolClosed).is_connection());
    }

    #[test]
    fn test_rollback_failed_reports_both() {
        let err = LedgerError::RollbackFailed {
            error: Box::new(LedgerError::NotFound("account 9".into())),
            rollback: Box::new(LedgerError::Connection("socket closed".into())),
        };
        assert_eq!(
            err.to_string(),
            "tx err: Not found: account 9, rollback err: Connection error: socket closed"
        );
        assert!(!err.is_transient());
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_validation_flags() {
        assert!(LedgerError::InvalidAmount(-1).is_validation());
        assert!(LedgerError::InvalidCurrency("GBP".into()).is_validation());
        assert!(!LedgerError::NotFound("x".into()).is_validation());
    }
}
