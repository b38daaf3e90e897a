//! In-process [`BookingStore`].
//!
//! All tables sit behind one async mutex, so each trait method runs as a
//! single atomic step, the same guarantee the Postgres store gets from its
//! conditional updates and transactions.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use eyre::Result;
use ridepool_core::{
    models::{
        ride::{NewRide, Ride, RideStatus, RideUpdate},
        ride_request::{RequestStatus, RideRequest},
        user::UserSummary,
        RequestId, RideId, UserId,
    },
    search::{
        BookingListing, BookingSearch, DriverRequestSearch, IncomingRequest, Page, RideListing,
        RideSearch, TripSummary,
    },
    store::{ApproveOutcome, BookingStore, RejectOutcome, UpdateOutcome},
};
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, UserSummary>,
    rides: BTreeMap<RideId, Ride>,
    requests: BTreeMap<RequestId, RideRequest>,
    last_ride_id: RideId,
    last_request_id: RequestId,
}

impl Tables {
    fn user_name(&self, id: UserId) -> Option<&UserSummary> {
        self.users.get(&id)
    }

    fn page<T>(items: Vec<T>, pagination: ridepool_core::search::Pagination) -> Page<T> {
        let total = items.len() as i64;
        Page {
            items: pagination.apply(items),
            total,
        }
    }

    /// Requests ordered newest first, ties broken by id.
    fn requests_newest_first(&self) -> Vec<&RideRequest> {
        let mut requests: Vec<&RideRequest> = self.requests.values().collect();
        requests.sort_by(|a, b| {
            b.requested_at
                .cmp(&a.requested_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        requests
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: UserSummary) {
        self.tables.lock().await.users.insert(user.id, user);
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<UserSummary>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn insert_ride(&self, new_ride: NewRide) -> Result<Ride> {
        let mut tables = self.tables.lock().await;
        tables.last_ride_id += 1;
        let now = Utc::now();
        let ride = Ride {
            id: tables.last_ride_id,
            driver_id: new_ride.driver_id,
            vehicle_name: new_ride.vehicle_name,
            vehicle_number: new_ride.vehicle_number,
            from_location: new_ride.from_location,
            to_location: new_ride.to_location,
            ride_date: new_ride.ride_date,
            ride_time: new_ride.ride_time,
            seats_available: new_ride.seats_available,
            seats_booked: 0,
            notes: new_ride.notes,
            status: RideStatus::Active,
            created_at: now,
            updated_at: now,
        };
        tables.rides.insert(ride.id, ride.clone());
        Ok(ride)
    }

    async fn find_ride(&self, id: RideId) -> Result<Option<Ride>> {
        Ok(self.tables.lock().await.rides.get(&id).cloned())
    }

    async fn rides_by_driver(&self, driver_id: UserId) -> Result<Vec<Ride>> {
        let tables = self.tables.lock().await;
        let mut rides: Vec<Ride> = tables
            .rides
            .values()
            .filter(|r| r.driver_id == driver_id)
            .cloned()
            .collect();
        rides.sort_by_key(|r| (r.departure(), r.id));
        Ok(rides)
    }

    async fn update_ride(&self, id: RideId, update: RideUpdate) -> Result<UpdateOutcome> {
        let mut tables = self.tables.lock().await;
        let Some(ride) = tables.rides.get_mut(&id) else {
            return Ok(UpdateOutcome::Missing);
        };
        if update.is_empty() {
            return Ok(UpdateOutcome::Updated(ride.clone()));
        }
        if !update.counters_fit(ride) {
            return Ok(UpdateOutcome::OutOfRange);
        }
        update.apply(ride);
        ride.updated_at = Utc::now();
        Ok(UpdateOutcome::Updated(ride.clone()))
    }

    async fn delete_ride(&self, id: RideId) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if tables.rides.remove(&id).is_none() {
            return Ok(false);
        }
        tables.requests.retain(|_, r| r.ride_id != id);
        Ok(true)
    }

    async fn search_available(&self, search: RideSearch) -> Result<Page<RideListing>> {
        let tables = self.tables.lock().await;
        let excluded = |ride: &Ride| {
            search.exclude_rider.map_or(false, |rider_id| {
                tables
                    .requests
                    .values()
                    .any(|r| r.ride_id == ride.id && r.rider_id == rider_id)
            })
        };

        let mut listings: Vec<RideListing> = tables
            .rides
            .values()
            .filter(|ride| search.matches(ride) && !excluded(ride))
            .filter_map(|ride| {
                tables.user_name(ride.driver_id).map(|driver| RideListing {
                    ride: ride.clone(),
                    driver_name: driver.name.clone(),
                })
            })
            .collect();
        listings.sort_by_key(|l| (l.ride.departure(), l.ride.id));

        Ok(Tables::page(listings, search.pagination))
    }

    async fn find_request(&self, id: RequestId) -> Result<Option<RideRequest>> {
        Ok(self.tables.lock().await.requests.get(&id).cloned())
    }

    async fn find_request_by_pair(
        &self,
        ride_id: RideId,
        rider_id: UserId,
    ) -> Result<Option<RideRequest>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .requests
            .values()
            .find(|r| r.ride_id == ride_id && r.rider_id == rider_id)
            .cloned())
    }

    async fn insert_request(
        &self,
        ride_id: RideId,
        rider_id: UserId,
    ) -> Result<Option<RideRequest>> {
        let mut tables = self.tables.lock().await;
        let exists = tables
            .requests
            .values()
            .any(|r| r.ride_id == ride_id && r.rider_id == rider_id);
        if exists {
            return Ok(None);
        }
        tables.last_request_id += 1;
        let request = RideRequest::new_pending(tables.last_request_id, ride_id, rider_id, Utc::now());
        tables.requests.insert(request.id, request.clone());
        Ok(Some(request))
    }

    async fn approve_request(&self, id: RequestId) -> Result<ApproveOutcome> {
        let mut tables = self.tables.lock().await;
        let Tables {
            rides, requests, ..
        } = &mut *tables;

        let Some(request) = requests.get_mut(&id) else {
            return Ok(ApproveOutcome::Missing);
        };
        if request.status() != RequestStatus::Pending {
            return Ok(ApproveOutcome::NotPending(request.status()));
        }
        let Some(ride) = rides.get_mut(&request.ride_id) else {
            return Ok(ApproveOutcome::Missing);
        };
        if ride.book_seat().is_err() {
            return Ok(ApproveOutcome::NoSeats);
        }

        let now = Utc::now();
        ride.updated_at = now;
        request.approve(now);
        Ok(ApproveOutcome::Approved {
            request: request.clone(),
            ride: ride.clone(),
        })
    }

    async fn reject_request(&self, id: RequestId) -> Result<RejectOutcome> {
        let mut tables = self.tables.lock().await;
        let Tables {
            rides, requests, ..
        } = &mut *tables;

        let Some(request) = requests.get_mut(&id) else {
            return Ok(RejectOutcome::Missing);
        };
        let previous = request.status();
        if previous == RequestStatus::Rejected {
            return Ok(RejectOutcome::AlreadyRejected);
        }
        let Some(ride) = rides.get_mut(&request.ride_id) else {
            return Ok(RejectOutcome::Missing);
        };

        let now = Utc::now();
        if previous == RequestStatus::Approved && ride.release_seat() {
            ride.updated_at = now;
        }
        request.reject(now);
        Ok(RejectOutcome::Rejected {
            request: request.clone(),
            ride: ride.clone(),
            previous,
        })
    }

    async fn rider_bookings(&self, search: BookingSearch) -> Result<Page<BookingListing>> {
        let tables = self.tables.lock().await;
        let listings: Vec<BookingListing> = tables
            .requests_newest_first()
            .into_iter()
            .filter_map(|request| {
                let ride = tables.rides.get(&request.ride_id)?;
                if !search.matches(request, ride) {
                    return None;
                }
                let driver = tables.user_name(ride.driver_id)?;
                Some(BookingListing {
                    request: request.clone(),
                    trip: TripSummary::from(ride),
                    driver_id: ride.driver_id,
                    driver_name: driver.name.clone(),
                })
            })
            .collect();

        Ok(Tables::page(listings, search.pagination))
    }

    async fn driver_requests(&self, search: DriverRequestSearch) -> Result<Page<IncomingRequest>> {
        let tables = self.tables.lock().await;
        let listings: Vec<IncomingRequest> = tables
            .requests_newest_first()
            .into_iter()
            .filter_map(|request| {
                let ride = tables.rides.get(&request.ride_id)?;
                if !search.matches(request, ride) {
                    return None;
                }
                let rider = tables.user_name(request.rider_id)?;
                Some(IncomingRequest {
                    request: request.clone(),
                    trip: TripSummary::from(ride),
                    seats_available: ride.seats_available,
                    seats_booked: ride.seats_booked,
                    rider_name: rider.name.clone(),
                    rider_email: rider.email.clone(),
                })
            })
            .collect();

        Ok(Tables::page(listings, search.pagination))
    }
}
