//! Error types for the circulation server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::circulation::{CirculationError, IneligibilityReason};

/// Stable numeric error codes exposed to desk clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchUser = 4,
    NoSuchItem = 5,
    ItemNotAvailable = 7,
    MaxBorrowsReached = 11,
    NotBorrowable = 12,
    BadValue = 18,
    NoSuchData = 20,
    MaxRenewalsReached = 22,
    LoanNotOpen = 23,
    AuditFailure = 24,
    AlreadyNotified = 25,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Circulation(#[from] CirculationError),
}

impl AppError {
    /// The circulation error kind, if this is one
    pub fn circulation(&self) -> Option<&CirculationError> {
        match self {
            AppError::Circulation(e) => Some(e),
            _ => None,
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Every reason a reader was refused, in reporting order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasons: Option<Vec<IneligibilityReason>>,
}

fn circulation_status(err: &CirculationError) -> (StatusCode, ErrorCode) {
    match err {
        CirculationError::NotEligible(reasons) => {
            let code = if reasons.contains(&IneligibilityReason::LoanLimitReached) {
                ErrorCode::MaxBorrowsReached
            } else {
                ErrorCode::NotBorrowable
            };
            (StatusCode::UNPROCESSABLE_ENTITY, code)
        }
        CirculationError::CopyUnavailable(_) => (StatusCode::CONFLICT, ErrorCode::ItemNotAvailable),
        CirculationError::RenewalLimitReached(_) => {
            (StatusCode::CONFLICT, ErrorCode::MaxRenewalsReached)
        }
        CirculationError::LoanNotOpen(_) => (StatusCode::CONFLICT, ErrorCode::LoanNotOpen),
        CirculationError::ReaderNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchUser),
        CirculationError::CopyNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchItem),
        CirculationError::LoanNotFound(_) | CirculationError::CopyNotOnLoan(_) => {
            (StatusCode::NOT_FOUND, ErrorCode::NoSuchData)
        }
        CirculationError::ReminderThrottled(_) => {
            (StatusCode::CONFLICT, ErrorCode::AlreadyNotified)
        }
        CirculationError::ActorRequired => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized),
        CirculationError::InvalidPolicy(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::BadValue)
        }
        CirculationError::AuditRecordingFailed(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::AuditFailure)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut reasons = None;
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::Circulation(err) => {
                if let CirculationError::NotEligible(list) = err {
                    reasons = Some(list.clone());
                }
                let (status, code) = circulation_status(err);
                (status, code, err.to_string())
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            reasons,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_kinds_map_to_409() {
        for err in [
            CirculationError::CopyUnavailable(1),
            CirculationError::LoanNotOpen(1),
            CirculationError::RenewalLimitReached(1),
        ] {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn test_not_eligible_is_unprocessable() {
        let err = CirculationError::NotEligible(vec![IneligibilityReason::ReaderBlocked]);
        assert_eq!(
            circulation_status(&err),
            (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::NotBorrowable)
        );
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_missing_actor_is_unauthorized() {
        let response = AppError::from(CirculationError::ActorRequired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
