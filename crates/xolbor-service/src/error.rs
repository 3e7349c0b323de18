//! API error types and responses.
//!
//! Every failure renders as `{ "success": false, "error": "<Code>", "message": "..." }`,
//! plus a `details` object for errors that carry structured data.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use xolbor_core::LedgerError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A ledger rule or precondition rejected the request.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Malformed request body, query or path.
    #[error("{0}")]
    Validation(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ledger(err) => err.code(),
            Self::Unauthorized => "Unauthorized",
            Self::Validation(_) => "ValidationError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Ledger(err) => ledger_status(err),
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured data clients can act on without parsing the message.
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        let Self::Ledger(err) = self else {
            return None;
        };

        match err {
            LedgerError::InsufficientBalance { balance, required } => Some(json!({
                "balance": balance,
                "required": required,
            })),
            LedgerError::AlreadyOwned {
                account_id,
                item_id,
            } => Some(json!({
                "accountId": account_id.to_string(),
                "itemId": item_id.get(),
            })),
            LedgerError::ItemNotFound { item_id } | LedgerError::ItemAlreadyExists { item_id } => {
                Some(json!({ "itemId": item_id.get() }))
            }
            LedgerError::AccountNotFound { account_id } => {
                Some(json!({ "accountId": account_id.to_string() }))
            }
            LedgerError::IdempotencyConflict { key } => Some(json!({ "idempotencyKey": key })),
            _ => None,
        }
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::AccountNotFound { .. } | LedgerError::ItemNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        LedgerError::AlreadyOwned { .. }
        | LedgerError::InsufficientBalance { .. }
        | LedgerError::InvalidAmount(_)
        | LedgerError::InvalidItem(_)
        | LedgerError::Validation(_)
        | LedgerError::InvalidId(_) => StatusCode::BAD_REQUEST,
        LedgerError::DuplicateUsername { .. }
        | LedgerError::DuplicateEmail { .. }
        | LedgerError::AccountAlreadyExists { .. }
        | LedgerError::ItemAlreadyExists { .. }
        | LedgerError::IdempotencyConflict { .. } => StatusCode::CONFLICT,
        LedgerError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        LedgerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            error: self.code(),
            message,
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}
