//! REST endpoints under `/stats`
//!
//! - `POST /stats/events?server=` - Ingest a batch (requires `stats:write`)
//! - `GET /stats/player/:player_id` - One player's rows
//! - `GET /stats/leaderboard` - Ranked page of one timeframe
//! - `GET /stats/clans` - Clan roll-ups
//! - `GET /stats/columns` - Stat column catalogue
//! - `POST /stats/reset?target=&secret=` - Clear wipe/monthly ledgers
//!
//! Every response uses the same envelope:
//! `{"success": true, "data": ...}` or
//! `{"success": false, "error": {"code", "message", "details"?}}`.

pub mod admin;
pub mod clans;
pub mod columns;
pub mod events;
pub mod leaderboard;
pub mod players;

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::auth::AuthError;
use crate::engine::IngestError;
use crate::store::StoreError;
use crate::validation::{ValidationCode, ValidationError};

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// API error response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(code: ValidationCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code.as_str(), message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    /// Generic 500; the cause is logged by the caller, never returned
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal server error")
    }

    pub fn storage() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE_ERROR",
            "Stats storage is unavailable",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = json!({
            "code": self.code,
            "message": self.message,
        });
        if let Some(details) = self.details {
            error["details"] = details;
        }
        (self.status, Json(json!({ "success": false, "error": error }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: e.code.as_str(),
            message: e.message,
            details: e.details,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InsufficientPermissions => ApiError::forbidden(e.to_string()),
            _ => ApiError::unauthorized(e.to_string()),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Validation(e) => e.into(),
            IngestError::StorageUnavailable { .. } => {
                log::error!("{}", e);
                ApiError::storage()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        log::error!("Store error: {}", e);
        ApiError::internal()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "INVALID_QUERY", e.body_text())
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
