//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use brokerage_core::export::ExportError;
use brokerage_db::repositories::{CustomerError, UserManagementError};
use brokerage_shared::AppError;

/// An [`AppError`] rendered as `{"error": code, "message": text}`.
///
/// Server-side failures are logged and answered with a generic message.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if err.is_client_error() {
            err.to_string()
        } else {
            error!(error = %err, "Request failed");
            "An error occurred".to_string()
        };

        (
            status,
            Json(json!({
                "error": err.error_code(),
                "message": message
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        Self(err.into())
    }
}

impl From<CustomerError> for ApiError {
    fn from(err: CustomerError) -> Self {
        Self(err.into())
    }
}

impl From<UserManagementError> for ApiError {
    fn from(err: UserManagementError) -> Self {
        Self(err.into())
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
