//! Scripted [`BookingStore`] for exercising failure paths that a real store
//! rarely produces.

use async_trait::async_trait;
use eyre::Result;
use mockall::mock;
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

mock! {
    pub Store {}

    #[async_trait]
    impl BookingStore for Store {
        async fn find_user(&self, id: UserId) -> Result<Option<UserSummary>>;
        async fn insert_ride(&self, ride: NewRide) -> Result<Ride>;
        async fn find_ride(&self, id: RideId) -> Result<Option<Ride>>;
        async fn rides_by_driver(&self, driver_id: UserId) -> Result<Vec<Ride>>;
        async fn update_ride(&self, id: RideId, update: RideUpdate) -> Result<UpdateOutcome>;
        async fn delete_ride(&self, id: RideId) -> Result<bool>;
        async fn search_available(&self, search: RideSearch) -> Result<Page<RideListing>>;
        async fn find_request(&self, id: RequestId) -> Result<Option<RideRequest>>;
        async fn find_request_by_pair(
            &self,
            ride_id: RideId,
            rider_id: UserId,
        ) -> Result<Option<RideRequest>>;
        async fn insert_request(
            &self,
            ride_id: RideId,
            rider_id: UserId,
        ) -> Result<Option<RideRequest>>;
        async fn approve_request(&self, id: RequestId) -> Result<ApproveOutcome>;
        async fn reject_request(&self, id: RequestId) -> Result<RejectOutcome>;
        async fn rider_bookings(&self, search: BookingSearch) -> Result<Page<BookingListing>>;
        async fn driver_requests(
            &self,
            search: DriverRequestSearch,
        ) -> Result<Page<IncomingRequest>>;
    }
}
