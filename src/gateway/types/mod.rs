//! Gateway types module
//!
//! ## Submodules
//! - [`request`]: Request bodies and query strings, validated into ledger params
//! - [`response`]: Response envelope, `ApiError` and error codes

pub mod request;
pub mod response;

pub use request::{CreateAccountRequest, ListAccountsQuery, TransferRequest};
pub use response::{ApiError, ApiResponse, ApiResult, error_codes, ok};
