use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers::rider, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/riders/rides/search", get(rider::search_rides))
        .route("/api/riders/rides/:ride_id/requests", post(rider::request_seat))
        .route("/api/riders/bookings", get(rider::list_bookings))
}
