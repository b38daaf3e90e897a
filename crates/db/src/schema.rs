use eyre::Result;
use sqlx::{Executor, Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Accounts are managed elsewhere; rides only read names and roles from here
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL UNIQUE,
            role VARCHAR(16) NOT NULL CHECK (role IN ('driver', 'rider')),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create rides table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rides (
            id BIGSERIAL PRIMARY KEY,
            driver_id BIGINT NOT NULL REFERENCES users(id),
            vehicle_name VARCHAR(255) NOT NULL,
            vehicle_number VARCHAR(64) NOT NULL,
            from_location VARCHAR(255) NOT NULL,
            to_location VARCHAR(255) NOT NULL,
            ride_date DATE NOT NULL,
            ride_time TIME NOT NULL,
            seats_available INTEGER NOT NULL CHECK (seats_available >= 1),
            seats_booked INTEGER NOT NULL DEFAULT 0,
            notes TEXT NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'active'
                CHECK (status IN ('active', 'cancelled')),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT seats_within_capacity
                CHECK (seats_booked >= 0 AND seats_booked <= seats_available)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create ride_requests table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ride_requests (
            id BIGSERIAL PRIMARY KEY,
            ride_id BIGINT NOT NULL REFERENCES rides(id) ON DELETE CASCADE,
            rider_id BIGINT NOT NULL REFERENCES users(id),
            status VARCHAR(16) NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'approved', 'rejected')),
            requested_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            approved_at TIMESTAMP WITH TIME ZONE NULL,
            rejected_at TIMESTAMP WITH TIME ZONE NULL,
            CONSTRAINT one_request_per_rider UNIQUE (ride_id, rider_id),
            CONSTRAINT single_decision CHECK (approved_at IS NULL OR rejected_at IS NULL)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Several statements in one round trip need the simple query protocol
    pool.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_rides_driver_id ON rides(driver_id);
        CREATE INDEX IF NOT EXISTS idx_rides_departure ON rides(ride_date, ride_time);
        CREATE INDEX IF NOT EXISTS idx_ride_requests_ride_id ON ride_requests(ride_id);
        CREATE INDEX IF NOT EXISTS idx_ride_requests_rider_id ON ride_requests(rider_id);
        "#,
    )
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
