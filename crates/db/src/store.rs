//! PostgreSQL-backed [`BookingStore`].

use async_trait::async_trait;
use eyre::Result;
use ridepool_core::{
    models::{
        ride::{NewRide, Ride, RideUpdate},
        ride_request::RideRequest,
        user::UserSummary,
        RequestId, RideId, UserId,
    },
    search::{
        BookingListing, BookingSearch, DriverRequestSearch, IncomingRequest, Page, RideListing,
        RideSearch,
    },
    store::{ApproveOutcome, BookingStore, RejectOutcome, UpdateOutcome},
};

use crate::{
    models::convert_all,
    repositories::{
        ride,
        ride_request::{self, ApproveRow, RejectRow},
        user,
    },
    DbPool,
};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn find_user(&self, id: UserId) -> Result<Option<UserSummary>> {
        user::get_user_by_id(&self.pool, id)
            .await?
            .map(UserSummary::try_from)
            .transpose()
    }

    async fn insert_ride(&self, new_ride: NewRide) -> Result<Ride> {
        ride::create_ride(&self.pool, &new_ride).await?.try_into()
    }

    async fn find_ride(&self, id: RideId) -> Result<Option<Ride>> {
        ride::get_ride_by_id(&self.pool, id)
            .await?
            .map(Ride::try_from)
            .transpose()
    }

    async fn rides_by_driver(&self, driver_id: UserId) -> Result<Vec<Ride>> {
        convert_all(ride::get_rides_by_driver(&self.pool, driver_id).await?)
    }

    async fn update_ride(&self, id: RideId, update: RideUpdate) -> Result<UpdateOutcome> {
        let updated = if update.is_empty() {
            ride::get_ride_by_id(&self.pool, id).await?
        } else {
            ride::update_ride(&self.pool, id, &update).await?
        };
        if let Some(row) = updated {
            return Ok(UpdateOutcome::Updated(Ride::try_from(row)?));
        }
        // The conditional update matched nothing: tell a vanished ride apart
        // from counters that no longer fit.
        if ride::get_ride_by_id(&self.pool, id).await?.is_some() {
            Ok(UpdateOutcome::OutOfRange)
        } else {
            Ok(UpdateOutcome::Missing)
        }
    }

    async fn delete_ride(&self, id: RideId) -> Result<bool> {
        ride::delete_ride(&self.pool, id).await
    }

    async fn search_available(&self, search: RideSearch) -> Result<Page<RideListing>> {
        let (rows, total) = ride::search_available(&self.pool, &search).await?;
        Ok(Page {
            items: convert_all(rows)?,
            total,
        })
    }

    async fn find_request(&self, id: RequestId) -> Result<Option<RideRequest>> {
        ride_request::get_request_by_id(&self.pool, id)
            .await?
            .map(RideRequest::try_from)
            .transpose()
    }

    async fn find_request_by_pair(
        &self,
        ride_id: RideId,
        rider_id: UserId,
    ) -> Result<Option<RideRequest>> {
        ride_request::get_request_by_ride_and_rider(&self.pool, ride_id, rider_id)
            .await?
            .map(RideRequest::try_from)
            .transpose()
    }

    async fn insert_request(
        &self,
        ride_id: RideId,
        rider_id: UserId,
    ) -> Result<Option<RideRequest>> {
        ride_request::create_request(&self.pool, ride_id, rider_id)
            .await?
            .map(RideRequest::try_from)
            .transpose()
    }

    async fn approve_request(&self, id: RequestId) -> Result<ApproveOutcome> {
        Ok(match ride_request::approve_request(&self.pool, id).await? {
            ApproveRow::Approved(request, ride) => ApproveOutcome::Approved {
                request: request.try_into()?,
                ride: ride.try_into()?,
            },
            ApproveRow::NotPending(status) => ApproveOutcome::NotPending(status.parse()?),
            ApproveRow::NoSeats => ApproveOutcome::NoSeats,
            ApproveRow::Missing => ApproveOutcome::Missing,
        })
    }

    async fn reject_request(&self, id: RequestId) -> Result<RejectOutcome> {
        Ok(match ride_request::reject_request(&self.pool, id).await? {
            RejectRow::Rejected(request, ride, previous) => RejectOutcome::Rejected {
                request: request.try_into()?,
                ride: ride.try_into()?,
                previous: previous.parse()?,
            },
            RejectRow::AlreadyRejected => RejectOutcome::AlreadyRejected,
            RejectRow::Missing => RejectOutcome::Missing,
        })
    }

    async fn rider_bookings(&self, search: BookingSearch) -> Result<Page<BookingListing>> {
        let (rows, total) = ride_request::search_by_rider(&self.pool, &search).await?;
        Ok(Page {
            items: convert_all(rows)?,
            total,
        })
    }

    async fn driver_requests(&self, search: DriverRequestSearch) -> Result<Page<IncomingRequest>> {
        let (rows, total) = ride_request::search_by_driver(&self.pool, &search).await?;
        Ok(Page {
            items: convert_all(rows)?,
            total,
        })
    }
}
