//! Request validation errors

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Machine-readable validation failure codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    InvalidBody,
    BatchTooLarge,
    NoValidEvents,
    InvalidServerId,
    InvalidPlayerId,
    InvalidTimeframe,
    InvalidSort,
    InvalidTarget,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::InvalidBody => "INVALID_BODY",
            ValidationCode::BatchTooLarge => "BATCH_TOO_LARGE",
            ValidationCode::NoValidEvents => "NO_VALID_EVENTS",
            ValidationCode::InvalidServerId => "INVALID_SERVER_ID",
            ValidationCode::InvalidPlayerId => "INVALID_PLAYER_ID",
            ValidationCode::InvalidTimeframe => "INVALID_TIMEFRAME",
            ValidationCode::InvalidSort => "INVALID_SORT",
            ValidationCode::InvalidTarget => "INVALID_TARGET",
        }
    }
}

/// A caller-facing validation failure, surfaced as HTTP 400
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{code_str}: {message}", code_str = .code.as_str())]
pub struct ValidationError {
    pub code: ValidationCode,
    pub message: String,
    /// Field-level detail where available
    pub details: Option<Value>,
}

impl ValidationError {
    pub fn new(code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Why a single event was dropped from its batch
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RejectReason {
    #[error("event is not an object")]
    NotAnObject,

    #[error("player id must be exactly 17 digits")]
    InvalidPlayerId,

    #[error("unknown event type '{0}'")]
    UnknownEvent(String),

    #[error("missing event type")]
    MissingEvent,

    #[error("amount is not a non-negative number")]
    InvalidAmount,
}
