use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::service::attendance::AttendanceError;
use crate::service::leave::LeaveError;
use crate::store::StoreError;

/// Errors as the HTTP layer reports them.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "Employee ID not found")]
    EmployeeNotFound,
    #[display(fmt = "Incorrect password")]
    WrongPassword,
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "{}", _0)]
    StoreUnavailable(String),
    #[display(fmt = "{}", _0)]
    UploadFailed(String),
    #[display(fmt = "{}", _0)]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::EmployeeNotFound | AppError::WrongPassword => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::StoreUnavailable(cause) => {
                tracing::error!(cause = %cause, "Record store unavailable");
                "Attendance records are temporarily unavailable".to_string()
            }
            AppError::UploadFailed(cause) => {
                tracing::error!(cause = %cause, "Photo upload failed");
                "Photo upload failed".to_string()
            }
            AppError::Internal(cause) => {
                tracing::error!(cause = %cause, "Internal error");
                "Internal Server Error".to_string()
            }
            other => {
                tracing::debug!(error = %other, "Request rejected");
                other.to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::StoreUnavailable(e.to_string())
    }
}

impl From<AttendanceError> for AppError {
    fn from(e: AttendanceError) -> Self {
        match e {
            AttendanceError::Store { source } => source.into(),
            AttendanceError::UploadFailed { source } => AppError::UploadFailed(source.to_string()),
            AttendanceError::SessionNotFound { .. } => {
                AppError::Conflict("No attendance session found for this login".to_string())
            }
            AttendanceError::SessionClosed { .. } => {
                AppError::Conflict("Attendance session already closed".to_string())
            }
            AttendanceError::AlreadyOpen { .. } => {
                AppError::Conflict("You already have an open attendance session today".to_string())
            }
        }
    }
}

impl From<LeaveError> for AppError {
    fn from(e: LeaveError) -> Self {
        match e {
            LeaveError::Validation { reason } => AppError::Validation(reason),
            LeaveError::Store { source } => source.into(),
        }
    }
}
