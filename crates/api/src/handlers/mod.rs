pub mod driver;
pub mod rider;

use ridepool_core::{errors::BookingError, search::Pagination};
use serde::Serialize;

use crate::middleware::error_handling::AppError;

/// Success envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T, M = ()> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<M>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
            message: None,
        }
    }
}

impl<T, M> ApiResponse<T, M> {
    pub fn with_meta<N>(self, meta: N) -> ApiResponse<T, N> {
        ApiResponse {
            success: self.success,
            data: self.data,
            meta: Some(meta),
            message: self.message,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Trimmed query text; blank counts as absent.
pub(crate) fn text(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Page and limit from loosely typed query values; junk falls back to defaults.
pub(crate) fn pagination(page: &Option<String>, limit: &Option<String>) -> Pagination {
    let number = |raw: &Option<String>| text(raw).and_then(|v| v.parse::<i64>().ok());
    Pagination::new(number(page), number(limit))
}

pub(crate) fn parse_id(raw: &str, message: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError(BookingError::Validation(message.to_string())))
}
