use crate::models::{DbBookingRow, DbIncomingRow, DbRide, DbRideRequest};
use crate::repositories::ride;
use eyre::{eyre, Result};
use ridepool_core::{
    models::ride_request::RequestStatus,
    search::{BookingSearch, DriverRequestSearch},
};
use sqlx::{Pool, Postgres, QueryBuilder};

const REQUEST_COLUMNS: &str =
    "id, ride_id, rider_id, status, requested_at, approved_at, rejected_at";

/// Outcome of the approve transaction, before conversion to domain types.
pub enum ApproveRow {
    Approved(DbRideRequest, DbRide),
    NotPending(String),
    NoSeats,
    Missing,
}

/// Outcome of the reject transaction, before conversion to domain types.
pub enum RejectRow {
    Rejected(DbRideRequest, DbRide, String),
    AlreadyRejected,
    Missing,
}

pub async fn get_request_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<DbRideRequest>> {
    let request = sqlx::query_as::<_, DbRideRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM ride_requests WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

pub async fn get_request_by_ride_and_rider(
    pool: &Pool<Postgres>,
    ride_id: i64,
    rider_id: i64,
) -> Result<Option<DbRideRequest>> {
    let request = sqlx::query_as::<_, DbRideRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM ride_requests WHERE ride_id = $1 AND rider_id = $2"
    ))
    .bind(ride_id)
    .bind(rider_id)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

/// Inserts a pending request. `None` means the (ride, rider) pair already exists.
pub async fn create_request(
    pool: &Pool<Postgres>,
    ride_id: i64,
    rider_id: i64,
) -> Result<Option<DbRideRequest>> {
    let request = sqlx::query_as::<_, DbRideRequest>(&format!(
        r#"
        INSERT INTO ride_requests (ride_id, rider_id, status, requested_at)
        VALUES ($1, $2, 'pending', NOW())
        ON CONFLICT (ride_id, rider_id) DO NOTHING
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(ride_id)
    .bind(rider_id)
    .fetch_optional(pool)
    .await?;

    if request.is_none() {
        tracing::debug!(
            "Ride request already exists: ride_id={}, rider_id={}",
            ride_id, rider_id
        );
    }
    Ok(request)
}

/// Marks a pending request approved and takes a seat for it, or changes nothing.
pub async fn approve_request(pool: &Pool<Postgres>, id: i64) -> Result<ApproveRow> {
    let mut tx = pool.begin().await?;

    let request = sqlx::query_as::<_, DbRideRequest>(&format!(
        r#"
        UPDATE ride_requests
        SET status = 'approved', approved_at = NOW(), rejected_at = NULL
        WHERE id = $1 AND status = 'pending'
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(request) = request else {
        let status = sqlx::query_scalar::<_, String>("SELECT status FROM ride_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.rollback().await?;
        return Ok(match status {
            Some(status) => ApproveRow::NotPending(status),
            None => ApproveRow::Missing,
        });
    };

    let Some(ride) = ride::book_seat(&mut tx, request.ride_id).await? else {
        tx.rollback().await?;
        tracing::debug!("No seat left on ride {} for request {}", request.ride_id, id);
        return Ok(ApproveRow::NoSeats);
    };

    tx.commit().await?;
    Ok(ApproveRow::Approved(request, ride))
}

/// Marks a request rejected and releases its seat if it had been approved.
pub async fn reject_request(pool: &Pool<Postgres>, id: i64) -> Result<RejectRow> {
    let mut tx = pool.begin().await?;

    let previous = sqlx::query_scalar::<_, String>(
        "SELECT status FROM ride_requests WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let previous = match previous {
        None => {
            tx.rollback().await?;
            return Ok(RejectRow::Missing);
        }
        Some(status) if status == RequestStatus::Rejected.as_str() => {
            tx.rollback().await?;
            return Ok(RejectRow::AlreadyRejected);
        }
        Some(status) => status,
    };

    let request = sqlx::query_as::<_, DbRideRequest>(&format!(
        r#"
        UPDATE ride_requests
        SET status = 'rejected', rejected_at = NOW(), approved_at = NULL
        WHERE id = $1
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    let released = if previous == RequestStatus::Approved.as_str() {
        ride::release_seat(&mut tx, request.ride_id).await?
    } else {
        None
    };
    let ride = match released {
        Some(ride) => ride,
        None => ride::get_ride_in(&mut tx, request.ride_id)
            .await?
            .ok_or_else(|| eyre!("Ride {} vanished while rejecting request {}", request.ride_id, id))?,
    };

    tx.commit().await?;
    Ok(RejectRow::Rejected(request, ride, previous))
}

const JOINED_REQUEST_COLUMNS: &str = r#"
    rr.id, rr.ride_id, rr.rider_id, rr.status, rr.requested_at, rr.approved_at, rr.rejected_at,
    r.from_location, r.to_location, r.ride_date, r.ride_time, r.vehicle_name, r.vehicle_number
"#;

fn push_booking_filters(query: &mut QueryBuilder<'_, Postgres>, search: &BookingSearch) {
    query.push(" WHERE rr.rider_id = ").push_bind(search.rider_id);
    if let Some(status) = search.status {
        query.push(" AND rr.status = ").push_bind(status.as_str());
    }
    if let Some(from) = search.from_date {
        query.push(" AND r.ride_date >= ").push_bind(from);
    }
    if let Some(to) = search.to_date {
        query.push(" AND r.ride_date <= ").push_bind(to);
    }
}

pub async fn search_by_rider(
    pool: &Pool<Postgres>,
    search: &BookingSearch,
) -> Result<(Vec<DbBookingRow>, i64)> {
    let mut count = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM ride_requests rr INNER JOIN rides r ON rr.ride_id = r.id",
    );
    push_booking_filters(&mut count, search);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut data = QueryBuilder::<Postgres>::new("SELECT ");
    data.push(JOINED_REQUEST_COLUMNS).push(
        ", r.driver_id, u.name AS driver_name \
         FROM ride_requests rr \
         INNER JOIN rides r ON rr.ride_id = r.id \
         INNER JOIN users u ON r.driver_id = u.id",
    );
    push_booking_filters(&mut data, search);
    data.push(" ORDER BY rr.requested_at DESC, rr.id DESC LIMIT ")
        .push_bind(i64::from(search.pagination.limit))
        .push(" OFFSET ")
        .push_bind(search.pagination.offset());

    let rows = data.build_query_as::<DbBookingRow>().fetch_all(pool).await?;
    Ok((rows, total))
}

fn push_driver_filters(query: &mut QueryBuilder<'_, Postgres>, search: &DriverRequestSearch) {
    query.push(" WHERE r.driver_id = ").push_bind(search.driver_id);
    if let Some(ride_id) = search.ride_id {
        query.push(" AND rr.ride_id = ").push_bind(ride_id);
    }
    if let Some(status) = search.status {
        query.push(" AND rr.status = ").push_bind(status.as_str());
    }
}

pub async fn search_by_driver(
    pool: &Pool<Postgres>,
    search: &DriverRequestSearch,
) -> Result<(Vec<DbIncomingRow>, i64)> {
    let mut count = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM ride_requests rr INNER JOIN rides r ON rr.ride_id = r.id",
    );
    push_driver_filters(&mut count, search);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut data = QueryBuilder::<Postgres>::new("SELECT ");
    data.push(JOINED_REQUEST_COLUMNS).push(
        ", r.seats_available, r.seats_booked, u.name AS rider_name, u.email AS rider_email \
         FROM ride_requests rr \
         INNER JOIN rides r ON rr.ride_id = r.id \
         INNER JOIN users u ON rr.rider_id = u.id",
    );
    push_driver_filters(&mut data, search);
    data.push(" ORDER BY rr.requested_at DESC, rr.id DESC LIMIT ")
        .push_bind(i64::from(search.pagination.limit))
        .push(" OFFSET ")
        .push_bind(search.pagination.offset());

    let rows = data.build_query_as::<DbIncomingRow>().fetch_all(pool).await?;
    Ok((rows, total))
}
