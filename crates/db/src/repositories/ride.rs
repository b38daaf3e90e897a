use crate::models::{DbRide, DbRideListing};
use eyre::Result;
use ridepool_core::{
    models::{format::TIME_FORMAT, ride::{NewRide, RideUpdate}},
    search::RideSearch,
};
use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

const RIDE_COLUMNS: &str = r#"
    id, driver_id, vehicle_name, vehicle_number, from_location, to_location,
    ride_date, ride_time, seats_available, seats_booked, notes, status,
    created_at, updated_at
"#;

pub async fn create_ride(pool: &Pool<Postgres>, ride: &NewRide) -> Result<DbRide> {
    tracing::debug!(
        "Creating ride: driver_id={}, from={}, to={}, seats={}",
        ride.driver_id, ride.from_location, ride.to_location, ride.seats_available
    );

    let ride = sqlx::query_as::<_, DbRide>(&format!(
        r#"
        INSERT INTO rides (
            driver_id, vehicle_name, vehicle_number, from_location, to_location,
            ride_date, ride_time, seats_available, seats_booked, notes, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, 'active')
        RETURNING {RIDE_COLUMNS}
        "#
    ))
    .bind(ride.driver_id)
    .bind(&ride.vehicle_name)
    .bind(&ride.vehicle_number)
    .bind(&ride.from_location)
    .bind(&ride.to_location)
    .bind(ride.ride_date)
    .bind(ride.ride_time)
    .bind(ride.seats_available)
    .bind(&ride.notes)
    .fetch_one(pool)
    .await?;

    tracing::debug!("Ride created successfully: id={}", ride.id);
    Ok(ride)
}

pub async fn get_ride_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<DbRide>> {
    let ride = sqlx::query_as::<_, DbRide>(&format!(
        "SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(ride)
}

pub async fn get_rides_by_driver(pool: &Pool<Postgres>, driver_id: i64) -> Result<Vec<DbRide>> {
    let rides = sqlx::query_as::<_, DbRide>(&format!(
        r#"
        SELECT {RIDE_COLUMNS}
        FROM rides
        WHERE driver_id = $1
        ORDER BY ride_date ASC, ride_time ASC, id ASC
        "#
    ))
    .bind(driver_id)
    .fetch_all(pool)
    .await?;

    Ok(rides)
}

/// Updates only the fields present in `update`. Callers skip empty updates.
///
/// The row is only touched when the resulting counters keep
/// `0 <= seats_booked <= seats_available` and `seats_available >= 1`, so a
/// concurrent approval cannot be overrun. `None` means no row matched.
pub async fn update_ride(
    pool: &Pool<Postgres>,
    id: i64,
    update: &RideUpdate,
) -> Result<Option<DbRide>> {
    let mut query = QueryBuilder::<Postgres>::new("UPDATE rides SET ");
    {
        let mut set = query.separated(", ");
        if let Some(v) = &update.vehicle_name {
            set.push("vehicle_name = ").push_bind_unseparated(v.trim().to_string());
        }
        if let Some(v) = &update.vehicle_number {
            set.push("vehicle_number = ").push_bind_unseparated(v.trim().to_string());
        }
        if let Some(v) = &update.from_location {
            set.push("from_location = ").push_bind_unseparated(v.trim().to_string());
        }
        if let Some(v) = &update.to_location {
            set.push("to_location = ").push_bind_unseparated(v.trim().to_string());
        }
        if let Some(v) = update.ride_date {
            set.push("ride_date = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.ride_time {
            set.push("ride_time = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.seats_available {
            set.push("seats_available = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.seats_booked {
            set.push("seats_booked = ").push_bind_unseparated(v);
        }
        if let Some(v) = &update.notes {
            let notes = Some(v.trim().to_string()).filter(|n| !n.is_empty());
            set.push("notes = ").push_bind_unseparated(notes);
        }
        if let Some(v) = update.status {
            set.push("status = ").push_bind_unseparated(v.as_str());
        }
        set.push("updated_at = NOW()");
    }
    query.push(" WHERE id = ").push_bind(id);

    let push_available = |query: &mut QueryBuilder<Postgres>| match update.seats_available {
        Some(v) => {
            query.push_bind(v);
        }
        None => {
            query.push("seats_available");
        }
    };
    let push_booked = |query: &mut QueryBuilder<Postgres>| match update.seats_booked {
        Some(v) => {
            query.push_bind(v);
        }
        None => {
            query.push("seats_booked");
        }
    };
    query.push(" AND ");
    push_available(&mut query);
    query.push(" >= 1 AND ");
    push_booked(&mut query);
    query.push(" >= 0 AND ");
    push_booked(&mut query);
    query.push(" <= ");
    push_available(&mut query);

    query
        .push(" RETURNING ")
        .push(RIDE_COLUMNS);

    let ride = query.build_query_as::<DbRide>().fetch_optional(pool).await?;
    Ok(ride)
}

pub async fn delete_ride(pool: &Pool<Postgres>, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM rides WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Takes one seat if any is left, in a single statement.
pub async fn book_seat(conn: &mut PgConnection, id: i64) -> Result<Option<DbRide>> {
    let ride = sqlx::query_as::<_, DbRide>(&format!(
        r#"
        UPDATE rides
        SET seats_booked = seats_booked + 1, updated_at = NOW()
        WHERE id = $1 AND seats_booked < seats_available
        RETURNING {RIDE_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(ride)
}

/// Gives one seat back unless the counter is already zero.
pub async fn release_seat(conn: &mut PgConnection, id: i64) -> Result<Option<DbRide>> {
    let ride = sqlx::query_as::<_, DbRide>(&format!(
        r#"
        UPDATE rides
        SET seats_booked = seats_booked - 1, updated_at = NOW()
        WHERE id = $1 AND seats_booked > 0
        RETURNING {RIDE_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(ride)
}

pub async fn get_ride_in(conn: &mut PgConnection, id: i64) -> Result<Option<DbRide>> {
    let ride = sqlx::query_as::<_, DbRide>(&format!(
        "SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(ride)
}

fn push_search_filters(query: &mut QueryBuilder<'_, Postgres>, search: &RideSearch) {
    query.push(" WHERE r.status = 'active' AND r.seats_available > r.seats_booked");
    if let Some(from) = &search.from_location {
        query
            .push(" AND r.from_location ILIKE ")
            .push_bind(format!("%{}%", from));
    }
    if let Some(to) = &search.to_location {
        query
            .push(" AND r.to_location ILIKE ")
            .push_bind(format!("%{}%", to));
    }
    if let Some(date) = search.ride_date {
        query.push(" AND r.ride_date = ").push_bind(date);
    }
    if let Some(time) = search.ride_time {
        query
            .push(" AND to_char(r.ride_time, 'HH24:MI') = ")
            .push_bind(time.format(TIME_FORMAT).to_string());
    }
    if let Some(rider_id) = search.exclude_rider {
        query
            .push(
                " AND NOT EXISTS (SELECT 1 FROM ride_requests rr \
                 WHERE rr.ride_id = r.id AND rr.rider_id = ",
            )
            .push_bind(rider_id)
            .push(")");
    }
}

pub async fn search_available(
    pool: &Pool<Postgres>,
    search: &RideSearch,
) -> Result<(Vec<DbRideListing>, i64)> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM rides r");
    push_search_filters(&mut count, search);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut data = QueryBuilder::<Postgres>::new(
        "SELECT r.*, u.name AS driver_name FROM rides r INNER JOIN users u ON r.driver_id = u.id",
    );
    push_search_filters(&mut data, search);
    data.push(" ORDER BY r.ride_date ASC, r.ride_time ASC, r.id ASC LIMIT ")
        .push_bind(i64::from(search.pagination.limit))
        .push(" OFFSET ")
        .push_bind(search.pagination.offset());

    let rows = data.build_query_as::<DbRideListing>().fetch_all(pool).await?;
    tracing::debug!("Ride search matched {} rides, returning {}", total, rows.len());

    Ok((rows, total))
}
