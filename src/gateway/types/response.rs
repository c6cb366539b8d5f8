//! API Response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `ApiError`: Error half of every handler result
//! - `error_codes`: Standard error code constants

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::ledger::LedgerError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or absent (error)
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Handler results
// ============================================================================

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// 200 OK with `data`
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// Error response carrying both the HTTP status and the API code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn into_err<T>(self) -> Result<T, Self> {
        Err(self)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = match &err {
            LedgerError::InvalidAmount(_) => error_codes::INVALID_AMOUNT,
            LedgerError::SameAccount(_)
            | LedgerError::InvalidAccountId(_)
            | LedgerError::InvalidCurrency(_) => error_codes::INVALID_PARAMETER,
            LedgerError::NotFound(_) => error_codes::ACCOUNT_NOT_FOUND,
            LedgerError::ConstraintViolation(_) => error_codes::CONFLICT,
            LedgerError::Serialization(_) => error_codes::TRY_AGAIN,
            LedgerError::Connection(_) => error_codes::SERVICE_UNAVAILABLE,
            LedgerError::Cancelled(_) => error_codes::TIMEOUT,
            LedgerError::Database(_) | LedgerError::RollbackFailed { .. } => {
                error_codes::INTERNAL_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %err, code = err.code(), "Ledger request failed");
        }
        Self::new(status, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.code, self.msg))).into_response()
    }
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INVALID_AMOUNT: i32 = 1002;
    pub const CURRENCY_MISMATCH: i32 = 1003;

    // Resource errors (4xxx)
    pub const ACCOUNT_NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4091;
    pub const TRY_AGAIN: i32 = 4092;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
    pub const TIMEOUT: i32 = 5004;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::success(42)).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["msg"], "ok");
        assert_eq!(json["data"], 42);
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let json = serde_json::to_value(ApiResponse::<()>::error(1001, "bad")).unwrap();
        assert_eq!(json["code"], 1001);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_ledger_error_mapping() {
        let cases = [
            (
                LedgerError::InvalidAmount(0),
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_AMOUNT,
            ),
            (
                LedgerError::SameAccount(1),
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_PARAMETER,
            ),
            (
                LedgerError::NotFound("account 9".into()),
                StatusCode::NOT_FOUND,
                error_codes::ACCOUNT_NOT_FOUND,
            ),
            (
                LedgerError::ConstraintViolation("accounts_owner_currency_key".into()),
                StatusCode::CONFLICT,
                error_codes::CONFLICT,
            ),
            (
                LedgerError::Serialization("deadlock detected".into()),
                StatusCode::CONFLICT,
                error_codes::TRY_AGAIN,
            ),
            (
                LedgerError::Connection("pool timed out".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::SERVICE_UNAVAILABLE,
            ),
            (
                LedgerError::Cancelled("deadline".into()),
                StatusCode::GATEWAY_TIMEOUT,
                error_codes::TIMEOUT,
            ),
            (
                LedgerError::Database("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
            ),
        ];

        for (err, status, code) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, status, "{}", api.msg);
            assert_eq!(api.code, code, "{}", api.msg);
        }
    }

    #[test]
    fn test_error_into_response_status() {
        let resp = ApiError::from(LedgerError::NotFound("account 3".into())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
