//! # Booking Engine
//!
//! Every operation that can change a ride's seat counter goes through
//! [`BookingEngine`]. The engine performs the lookups, ownership and status
//! checks, then hands the capacity-changing step to the store as a single
//! atomic operation, so two drivers' clicks racing for the last seat cannot
//! both win.
//!
//! Seat counts follow status transitions only: approving adds exactly one,
//! rejecting an approved request removes exactly one. Creating requests and
//! searching never touch the counter.

use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    errors::{BookingError, BookingResult},
    models::{
        ride::{bucket_rides, CreateRideRequest, DriverRides, Ride, RideFilter, RideStatus, RideUpdate},
        ride_request::{RequestStatus, RideRequest},
        user::Actor,
        RequestId, RideId, UserId,
    },
    search::{
        BookingListing, BookingSearch, DriverRequestSearch, IncomingRequest, Page, RideListing,
        RideSearch,
    },
    store::{ApproveOutcome, BookingStore, RejectOutcome, UpdateOutcome},
};

/// A request and its ride as they stand after an approve or reject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub request: RideRequest,
    pub ride: Ride,
}

#[derive(Clone)]
pub struct BookingEngine {
    store: Arc<dyn BookingStore>,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn BookingStore> {
        &self.store
    }

    async fn load_ride(&self, ride_id: RideId) -> BookingResult<Ride> {
        self.store
            .find_ride(ride_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Ride not found".to_string()))
    }

    async fn load_owned_ride(&self, actor: &Actor, ride_id: RideId) -> BookingResult<Ride> {
        actor.require_driver()?;
        let ride = self.load_ride(ride_id).await?;
        if !ride.is_owned_by(actor.id) {
            return Err(BookingError::Forbidden(
                "You can only manage your own rides".to_string(),
            ));
        }
        Ok(ride)
    }

    /// Loads a request and its ride, checking the actor drives that ride.
    async fn load_for_decision(
        &self,
        actor: &Actor,
        request_id: RequestId,
        verb: &str,
    ) -> BookingResult<(RideRequest, Ride)> {
        actor.require_driver()?;
        let request = self
            .store
            .find_request(request_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Ride request not found".to_string()))?;
        let ride = self.load_ride(request.ride_id).await?;
        if !ride.is_owned_by(actor.id) {
            return Err(BookingError::Forbidden(format!(
                "You can only {} requests for your own rides",
                verb
            )));
        }
        Ok((request, ride))
    }

    pub async fn create_ride(&self, actor: &Actor, input: CreateRideRequest) -> BookingResult<Ride> {
        actor.require_driver()?;
        let new_ride = input.validate(actor.id)?;
        let ride = self.store.insert_ride(new_ride).await?;
        info!(ride_id = ride.id, driver_id = actor.id, "ride created");
        Ok(ride)
    }

    /// Applies a partial update. Returns `Ok(None)` when the update names no field.
    pub async fn update_ride(
        &self,
        actor: &Actor,
        ride_id: RideId,
        update: RideUpdate,
    ) -> BookingResult<Option<Ride>> {
        let ride = self.load_owned_ride(actor, ride_id).await?;
        if update.is_empty() {
            return Ok(None);
        }
        update.validate_against(&ride)?;
        match self.store.update_ride(ride_id, update.clone()).await? {
            UpdateOutcome::Updated(ride) => {
                info!(ride_id, driver_id = actor.id, "ride updated");
                Ok(Some(ride))
            }
            UpdateOutcome::OutOfRange => {
                // An approval or rejection moved the counters after the check above.
                warn!(ride_id, "ride update lost a race on seat counters");
                let current = self.load_ride(ride_id).await?;
                update.validate_against(&current)?;
                Err(BookingError::Validation(
                    "seats_booked must stay between 0 and seats_available".to_string(),
                ))
            }
            UpdateOutcome::Missing => Err(BookingError::NotFound("Ride not found".to_string())),
        }
    }

    pub async fn cancel_ride(&self, actor: &Actor, ride_id: RideId) -> BookingResult<Ride> {
        let ride = self.load_owned_ride(actor, ride_id).await?;
        if ride.status == RideStatus::Cancelled {
            return Err(BookingError::InvalidState(
                "Ride is already cancelled".to_string(),
            ));
        }
        let update = RideUpdate {
            status: Some(RideStatus::Cancelled),
            ..RideUpdate::default()
        };
        let ride = match self.store.update_ride(ride_id, update).await? {
            UpdateOutcome::Updated(ride) => ride,
            UpdateOutcome::OutOfRange => {
                return Err(BookingError::InvalidState(
                    "Ride seat counters are inconsistent".to_string(),
                ))
            }
            UpdateOutcome::Missing => {
                return Err(BookingError::NotFound("Ride not found".to_string()))
            }
        };
        info!(ride_id, driver_id = actor.id, "ride cancelled");
        Ok(ride)
    }

    /// Administrative removal of a ride and every request made against it.
    pub async fn delete_ride(&self, ride_id: RideId) -> BookingResult<()> {
        if !self.store.delete_ride(ride_id).await? {
            return Err(BookingError::NotFound("Ride not found".to_string()));
        }
        info!(ride_id, "ride deleted");
        Ok(())
    }

    pub async fn list_driver_rides(
        &self,
        actor: &Actor,
        filter: RideFilter,
    ) -> BookingResult<DriverRides> {
        actor.require_driver()?;
        let rides = self.store.rides_by_driver(actor.id).await?;
        Ok(bucket_rides(rides, filter, Local::now().naive_local()))
    }

    pub async fn search_available_rides(
        &self,
        search: RideSearch,
    ) -> BookingResult<Page<RideListing>> {
        Ok(self.store.search_available(search).await?)
    }

    pub async fn request_seat(&self, rider_id: UserId, ride_id: RideId) -> BookingResult<RideRequest> {
        let ride = self.load_ride(ride_id).await?;
        if !ride.is_active() {
            return Err(BookingError::InvalidState(
                "You can only request seats on active rides.".to_string(),
            ));
        }
        if ride.is_owned_by(rider_id) {
            return Err(BookingError::Forbidden(
                "You cannot request a seat on your own ride.".to_string(),
            ));
        }
        if !ride.has_free_seat() {
            return Err(BookingError::Capacity(
                "No seats available for this ride.".to_string(),
            ));
        }

        let duplicate =
            || BookingError::Duplicate("You have already requested a seat for this ride.".to_string());
        if self.store.find_request_by_pair(ride_id, rider_id).await?.is_some() {
            return Err(duplicate());
        }
        let request = self
            .store
            .insert_request(ride_id, rider_id)
            .await?
            .ok_or_else(duplicate)?;

        info!(request_id = request.id, ride_id, rider_id, "seat requested");
        Ok(request)
    }

    pub async fn approve_request(
        &self,
        actor: &Actor,
        request_id: RequestId,
    ) -> BookingResult<Transition> {
        let (request, ride) = self.load_for_decision(actor, request_id, "approve").await?;
        if request.status() != RequestStatus::Pending {
            return Err(BookingError::InvalidState(format!(
                "Request is already {}",
                request.status()
            )));
        }
        if !ride.has_free_seat() {
            return Err(BookingError::Capacity(
                "No seats available for this ride".to_string(),
            ));
        }

        match self.store.approve_request(request_id).await? {
            ApproveOutcome::Approved { request, ride } => {
                info!(
                    request_id,
                    ride_id = ride.id,
                    seats_booked = ride.seats_booked,
                    "ride request approved"
                );
                Ok(Transition { request, ride })
            }
            ApproveOutcome::NotPending(status) => {
                warn!(request_id, %status, "request changed status during approval");
                Err(BookingError::InvalidState(format!(
                    "Request is already {}",
                    status
                )))
            }
            ApproveOutcome::NoSeats => {
                warn!(request_id, ride_id = ride.id, "last seat taken during approval");
                Err(BookingError::Capacity(
                    "No seats available for this ride".to_string(),
                ))
            }
            ApproveOutcome::Missing => Err(BookingError::NotFound(
                "Ride request not found".to_string(),
            )),
        }
    }

    pub async fn reject_request(
        &self,
        actor: &Actor,
        request_id: RequestId,
    ) -> BookingResult<Transition> {
        let (request, _) = self.load_for_decision(actor, request_id, "reject").await?;
        if request.status() == RequestStatus::Rejected {
            return Err(BookingError::InvalidState(
                "Request is already rejected".to_string(),
            ));
        }

        match self.store.reject_request(request_id).await? {
            RejectOutcome::Rejected {
                request,
                ride,
                previous,
            } => {
                info!(
                    request_id,
                    ride_id = ride.id,
                    %previous,
                    seats_booked = ride.seats_booked,
                    "ride request rejected"
                );
                Ok(Transition { request, ride })
            }
            RejectOutcome::AlreadyRejected => {
                warn!(request_id, "request rejected concurrently");
                Err(BookingError::InvalidState(
                    "Request is already rejected".to_string(),
                ))
            }
            RejectOutcome::Missing => Err(BookingError::NotFound(
                "Ride request not found".to_string(),
            )),
        }
    }

    pub async fn rider_bookings(&self, search: BookingSearch) -> BookingResult<Page<BookingListing>> {
        Ok(self.store.rider_bookings(search).await?)
    }

    /// Requests across the actor's rides. The search's driver is always the actor.
    pub async fn driver_requests(
        &self,
        actor: &Actor,
        search: DriverRequestSearch,
    ) -> BookingResult<Page<IncomingRequest>> {
        actor.require_driver()?;
        let search = DriverRequestSearch {
            driver_id: actor.id,
            ..search
        };
        Ok(self.store.driver_requests(search).await?)
    }
}
