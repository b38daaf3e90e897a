//! # Error Handling Middleware
//!
//! Maps [`BookingError`] onto HTTP status codes and the JSON error envelope
//! `{"success": false, "message": "..."}` shared by every endpoint.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ridepool_core::errors::BookingError;
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// # Example
///
/// ```
/// use axum::Json;
/// use ridepool_api::middleware::error_handling::AppError;
/// use ridepool_core::errors::BookingError;
///
/// async fn handler(seats: i32) -> Result<Json<i32>, AppError> {
///     if seats < 1 {
///         return Err(BookingError::Validation("seats must be positive".to_string()).into());
///     }
///     Ok(Json(seats))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub BookingError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BookingError::Validation(_)
            | BookingError::InvalidState(_)
            | BookingError::Capacity(_) => StatusCode::BAD_REQUEST,
            BookingError::Authentication(_) => StatusCode::UNAUTHORIZED,
            BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Duplicate(_) => StatusCode::CONFLICT,
            BookingError::Database(_) | BookingError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if !self.0.is_expected() {
            error!(error = ?self.0, "request failed");
        }

        let body = Json(json!({
            "success": false,
            "message": self.0.user_message(),
        }));

        (status, body).into_response()
    }
}

/// Allows `?` on `BookingResult` inside handlers.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

/// Store failures that reach a handler directly are treated as database errors.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(BookingError::Database(err))
    }
}

/// Request bodies that fail to parse get the same envelope as other client errors.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(BookingError::Validation(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}
