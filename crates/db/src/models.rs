use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use eyre::Result;
use ridepool_core::{
    models::{
        ride::Ride,
        ride_request::{RequestRecord, RideRequest},
        user::UserSummary,
    },
    search::{BookingListing, IncomingRequest, RideListing, TripSummary},
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl TryFrom<DbUser> for UserSummary {
    type Error = eyre::Report;

    fn try_from(row: DbUser) -> Result<Self> {
        Ok(UserSummary {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role.parse()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbRide {
    pub id: i64,
    pub driver_id: i64,
    pub vehicle_name: String,
    pub vehicle_number: String,
    pub from_location: String,
    pub to_location: String,
    pub ride_date: NaiveDate,
    pub ride_time: NaiveTime,
    pub seats_available: i32,
    pub seats_booked: i32,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbRide> for Ride {
    type Error = eyre::Report;

    fn try_from(row: DbRide) -> Result<Self> {
        Ok(Ride {
            id: row.id,
            driver_id: row.driver_id,
            vehicle_name: row.vehicle_name,
            vehicle_number: row.vehicle_number,
            from_location: row.from_location,
            to_location: row.to_location,
            ride_date: row.ride_date,
            ride_time: row.ride_time,
            seats_available: row.seats_available,
            seats_booked: row.seats_booked,
            notes: row.notes,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbRideRequest {
    pub id: i64,
    pub ride_id: i64,
    pub rider_id: i64,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbRideRequest> for RideRequest {
    type Error = eyre::Report;

    fn try_from(row: DbRideRequest) -> Result<Self> {
        let record = RequestRecord {
            id: row.id,
            ride_id: row.ride_id,
            rider_id: row.rider_id,
            status: row.status.parse()?,
            requested_at: row.requested_at,
            approved_at: row.approved_at,
            rejected_at: row.rejected_at,
        };
        Ok(RideRequest::try_from(record)?)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbRideListing {
    #[sqlx(flatten)]
    pub ride: DbRide,
    pub driver_name: String,
}

impl TryFrom<DbRideListing> for RideListing {
    type Error = eyre::Report;

    fn try_from(row: DbRideListing) -> Result<Self> {
        Ok(RideListing {
            ride: row.ride.try_into()?,
            driver_name: row.driver_name,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbTrip {
    pub from_location: String,
    pub to_location: String,
    pub ride_date: NaiveDate,
    pub ride_time: NaiveTime,
    pub vehicle_name: String,
    pub vehicle_number: String,
}

impl From<DbTrip> for TripSummary {
    fn from(row: DbTrip) -> Self {
        TripSummary {
            from_location: row.from_location,
            to_location: row.to_location,
            ride_date: row.ride_date,
            ride_time: row.ride_time,
            vehicle_name: row.vehicle_name,
            vehicle_number: row.vehicle_number,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbBookingRow {
    #[sqlx(flatten)]
    pub request: DbRideRequest,
    #[sqlx(flatten)]
    pub trip: DbTrip,
    pub driver_id: i64,
    pub driver_name: String,
}

impl TryFrom<DbBookingRow> for BookingListing {
    type Error = eyre::Report;

    fn try_from(row: DbBookingRow) -> Result<Self> {
        Ok(BookingListing {
            request: row.request.try_into()?,
            trip: row.trip.into(),
            driver_id: row.driver_id,
            driver_name: row.driver_name,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbIncomingRow {
    #[sqlx(flatten)]
    pub request: DbRideRequest,
    #[sqlx(flatten)]
    pub trip: DbTrip,
    pub seats_available: i32,
    pub seats_booked: i32,
    pub rider_name: String,
    pub rider_email: String,
}

impl TryFrom<DbIncomingRow> for IncomingRequest {
    type Error = eyre::Report;

    fn try_from(row: DbIncomingRow) -> Result<Self> {
        Ok(IncomingRequest {
            request: row.request.try_into()?,
            trip: row.trip.into(),
            seats_available: row.seats_available,
            seats_booked: row.seats_booked,
            rider_name: row.rider_name,
            rider_email: row.rider_email,
        })
    }
}

/// Converts a batch of rows, failing on the first malformed one.
pub fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = eyre::Report>,
{
    rows.into_iter().map(T::try_from).collect()
}
