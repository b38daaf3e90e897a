pub mod driver;
pub mod health;
pub mod rider;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// JSON 404 for paths no route claims.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Route not found" })),
    )
}
