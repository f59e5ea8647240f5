use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;
use thiserror::Error;

use crate::database::StoreError;

/// Why the pool had nothing to hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolExhaustion {
    /// The pool has no candidates left at all.
    Empty,
    /// The only remaining candidates share the registrant's own name.
    OnlySelf,
}

impl fmt::Display for PoolExhaustion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolExhaustion::Empty => write!(f, "No names available for assignment"),
            PoolExhaustion::OnlySelf => write!(f, "No suitable names available"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("This email has already been assigned a person")]
    DuplicateRegistration,
    #[error("{0}")]
    PoolExhausted(PoolExhaustion),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Failed to process assignment")]
    AssignmentFailed,
    #[error("Database is unavailable, please try again later")]
    StoreUnavailable,
}

impl AppError {
    /// Stable machine-readable identifier sent alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::DuplicateRegistration => "duplicate_registration",
            AppError::PoolExhausted(_) => "pool_exhausted",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::AssignmentFailed => "assignment_failed",
            AppError::StoreUnavailable => "store_unavailable",
        }
    }

    /// Internal failures, as opposed to rejections caused by the request itself.
    pub fn is_internal(&self) -> bool {
        matches!(self, AppError::AssignmentFailed | AppError::StoreUnavailable)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateRegistration => StatusCode::CONFLICT,
            AppError::PoolExhausted(_) => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::AssignmentFailed => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "kind": self.kind(),
            "error": self.to_string()
        }))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => AppError::DuplicateRegistration,
            StoreError::Unavailable(_) => AppError::StoreUnavailable,
            StoreError::Conflict(_) | StoreError::Backend(_) => AppError::AssignmentFailed,
        }
    }
}
