#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
use axum_test::TestServer;
use chrono::Duration;
use ridepool_api::{app, middleware::auth::issue_token, ApiState};
use ridepool_core::{
    models::user::{Role, UserSummary},
    BookingEngine,
};
use ridepool_db::MemoryStore;
use serde_json::{json, Value};

pub const SECRET: &str = "test-secret";

pub const DRIVER: i64 = 1;
pub const RIDER_A: i64 = 2;
pub const RIDER_B: i64 = 3;
pub const UNKNOWN_USER: i64 = 404;

pub struct TestContext {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        for (id, name, role) in [
            (DRIVER, "Dana", Role::Driver),
            (RIDER_A, "Arun", Role::Rider),
            (RIDER_B, "Bea", Role::Rider),
        ] {
            store
                .add_user(UserSummary {
                    id,
                    name: name.to_string(),
                    email: format!("{}@example.com", name.to_lowercase()),
                    role,
                })
                .await;
        }

        let state = Arc::new(ApiState {
            engine: BookingEngine::new(store.clone()),
            jwt_secret: SECRET.to_string(),
        });
        let server = TestServer::new(app(state)).expect("Failed to start test server");

        Self { server, store }
    }
}

/// Authorization header carrying a fresh token for `user_id`.
pub fn bearer(user_id: i64) -> (HeaderName, HeaderValue) {
    let token = issue_token(user_id, SECRET, Duration::hours(1)).expect("Failed to sign token");
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("Invalid header value"),
    )
}

pub fn ride_body(seats: i64) -> Value {
    json!({
        "vehicle_name": "Swift Dzire",
        "vehicle_number": "KA-03-9090",
        "from_location": "Koramangala",
        "to_location": "Airport",
        "ride_date": "2030-02-15",
        "ride_time": "14:30",
        "seats_available": seats,
        "notes": "Two bags max"
    })
}
