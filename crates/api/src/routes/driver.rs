use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers::driver, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/drivers/rides",
            get(driver::list_rides).post(driver::create_ride),
        )
        .route("/api/drivers/rides/:ride_id", patch(driver::update_ride))
        .route("/api/drivers/rides/:ride_id/cancel", post(driver::cancel_ride))
        .route("/api/drivers/requests", get(driver::list_requests))
        .route(
            "/api/drivers/requests/:request_id/approve",
            patch(driver::approve_request),
        )
        .route(
            "/api/drivers/requests/:request_id/reject",
            patch(driver::reject_request),
        )
}
