use async_trait::async_trait;
use eyre::Result;

use crate::{
    models::{
        ride::{NewRide, Ride, RideUpdate},
        ride_request::{RequestStatus, RideRequest},
        user::UserSummary,
        RequestId, RideId, UserId,
    },
    search::{
        BookingListing, BookingSearch, DriverRequestSearch, IncomingRequest, Page, RideListing,
        RideSearch,
    },
};

/// Result of atomically approving a request and taking a seat for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApproveOutcome {
    Approved { request: RideRequest, ride: Ride },
    /// The request left `pending` before the update ran.
    NotPending(RequestStatus),
    /// The ride was full when the update ran; nothing was changed.
    NoSeats,
    Missing,
}

/// Result of atomically rejecting a request and releasing its seat if it held one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectOutcome {
    Rejected {
        request: RideRequest,
        ride: Ride,
        previous: RequestStatus,
    },
    AlreadyRejected,
    Missing,
}

/// Result of atomically applying a partial ride update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(Ride),
    /// The seat counters the update would leave behind are out of range
    /// against the ride as stored; nothing was changed.
    OutOfRange,
    Missing,
}

/// Durable storage for users, rides and ride requests.
///
/// Every method is individually atomic. `approve_request` and
/// `reject_request` must change the request and the ride's seat counter
/// together, and `insert_request` must refuse a second request for the same
/// (ride, rider) pair by returning `None`.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<UserSummary>>;

    async fn insert_ride(&self, ride: NewRide) -> Result<Ride>;

    async fn find_ride(&self, id: RideId) -> Result<Option<Ride>>;

    /// All rides posted by a driver, ordered by date then time.
    async fn rides_by_driver(&self, driver_id: UserId) -> Result<Vec<Ride>>;

    /// Applies an update if the resulting seat counters still fit the stored ride.
    /// An empty update leaves the ride untouched.
    async fn update_ride(&self, id: RideId, update: RideUpdate) -> Result<UpdateOutcome>;

    /// Removes a ride and its requests. Returns whether anything was deleted.
    async fn delete_ride(&self, id: RideId) -> Result<bool>;

    /// Rides matching the search, ordered by date then time, with the total match count.
    async fn search_available(&self, search: RideSearch) -> Result<Page<RideListing>>;

    async fn find_request(&self, id: RequestId) -> Result<Option<RideRequest>>;

    async fn find_request_by_pair(
        &self,
        ride_id: RideId,
        rider_id: UserId,
    ) -> Result<Option<RideRequest>>;

    /// Creates a pending request, or returns `None` if the pair already has one.
    async fn insert_request(&self, ride_id: RideId, rider_id: UserId)
        -> Result<Option<RideRequest>>;

    async fn approve_request(&self, id: RequestId) -> Result<ApproveOutcome>;

    async fn reject_request(&self, id: RequestId) -> Result<RejectOutcome>;

    /// A rider's requests, most recently made first.
    async fn rider_bookings(&self, search: BookingSearch) -> Result<Page<BookingListing>>;

    /// Requests against a driver's rides, most recently made first.
    async fn driver_requests(&self, search: DriverRequestSearch) -> Result<Page<IncomingRequest>>;
}
