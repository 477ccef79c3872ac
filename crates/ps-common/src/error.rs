use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },
    #[error("cannot {requested} a commission in status {current}")]
    InvalidTransition { current: String, requested: String },
    #[error("bulk payout blocked: {0}")]
    BulkBlocked(String),
    #[error("not found")]
    NotFound,
    #[error("invalid invite code")]
    InvalidInviteCode,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("external service error: {0}")]
    External(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn transition(current: impl Into<String>, requested: impl Into<String>) -> Self {
        Self::InvalidTransition {
            current: current.into(),
            requested: requested.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::BulkBlocked(_) => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidInviteCode => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::External(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::InvalidTransition { .. } => "invalid_state_transition",
            Self::BulkBlocked(_) => "bulk_payout_blocked",
            Self::NotFound => "not_found",
            Self::InvalidInviteCode => "invalid_invite_code",
            Self::Conflict(_) => "conflict",
            Self::Config(_) => "config_error",
            Self::Storage(_) => "storage_error",
            Self::External(_) => "external_error",
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}
