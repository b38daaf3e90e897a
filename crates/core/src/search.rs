//! Read-side filters and listing shapes.
//!
//! Store implementations translate these filters into queries; the `matches`
//! predicates spell out the same rules for in-process evaluation.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::models::{
    format::{self, truncate_to_minute},
    ride::Ride,
    ride_request::{RequestStatus, RideRequest},
    RideId, UserId,
};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page window. Out-of-range input is clamped rather than refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).clamp(1, i64::from(u32::MAX)) as u32;
        let limit = limit
            .unwrap_or(i64::from(DEFAULT_PAGE_SIZE))
            .clamp(1, i64::from(MAX_PAGE_SIZE)) as u32;
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit as usize)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(pagination: Pagination, total: i64) -> Self {
        let limit = i64::from(pagination.limit);
        Self {
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Filters for rides a rider can still ask to join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RideSearch {
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub ride_date: Option<NaiveDate>,
    pub ride_time: Option<NaiveTime>,
    /// Hide rides this user already holds a request for, whatever its status.
    pub exclude_rider: Option<UserId>,
    pub pagination: Pagination,
}

impl RideSearch {
    /// Checks everything except `exclude_rider`, which needs request data.
    pub fn matches(&self, ride: &Ride) -> bool {
        ride.is_active()
            && ride.seats_available > ride.seats_booked
            && self
                .from_location
                .as_deref()
                .map_or(true, |f| contains_ignore_case(&ride.from_location, f))
            && self
                .to_location
                .as_deref()
                .map_or(true, |t| contains_ignore_case(&ride.to_location, t))
            && self.ride_date.map_or(true, |d| ride.ride_date == d)
            && self
                .ride_time
                .map_or(true, |t| truncate_to_minute(ride.ride_time) == truncate_to_minute(t))
    }
}

/// Filters for a rider's own requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSearch {
    pub rider_id: UserId,
    pub status: Option<RequestStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub pagination: Pagination,
}

impl BookingSearch {
    pub fn new(rider_id: UserId) -> Self {
        Self {
            rider_id,
            status: None,
            from_date: None,
            to_date: None,
            pagination: Pagination::default(),
        }
    }

    pub fn matches(&self, request: &RideRequest, ride: &Ride) -> bool {
        request.rider_id == self.rider_id
            && self.status.map_or(true, |s| request.status() == s)
            && self.from_date.map_or(true, |d| ride.ride_date >= d)
            && self.to_date.map_or(true, |d| ride.ride_date <= d)
    }
}

/// Filters for the requests made against a driver's rides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverRequestSearch {
    pub driver_id: UserId,
    pub ride_id: Option<RideId>,
    pub status: Option<RequestStatus>,
    pub pagination: Pagination,
}

impl DriverRequestSearch {
    pub fn new(driver_id: UserId) -> Self {
        Self {
            driver_id,
            ride_id: None,
            status: None,
            pagination: Pagination::default(),
        }
    }

    pub fn matches(&self, request: &RideRequest, ride: &Ride) -> bool {
        ride.driver_id == self.driver_id
            && request.ride_id == ride.id
            && self.ride_id.map_or(true, |id| request.ride_id == id)
            && self.status.map_or(true, |s| request.status() == s)
    }
}

/// A searchable ride together with the driver's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RideListing {
    #[serde(flatten)]
    pub ride: Ride,
    pub driver_name: String,
}

/// The trip fields repeated next to a request in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripSummary {
    pub from_location: String,
    pub to_location: String,
    #[serde(with = "format::date")]
    pub ride_date: NaiveDate,
    #[serde(with = "format::time")]
    pub ride_time: NaiveTime,
    pub vehicle_name: String,
    pub vehicle_number: String,
}

impl From<&Ride> for TripSummary {
    fn from(ride: &Ride) -> Self {
        Self {
            from_location: ride.from_location.clone(),
            to_location: ride.to_location.clone(),
            ride_date: ride.ride_date,
            ride_time: ride.ride_time,
            vehicle_name: ride.vehicle_name.clone(),
            vehicle_number: ride.vehicle_number.clone(),
        }
    }
}

/// One of a rider's requests, with the trip and its driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingListing {
    #[serde(flatten)]
    pub request: RideRequest,
    #[serde(flatten)]
    pub trip: TripSummary,
    pub driver_id: UserId,
    pub driver_name: String,
}

/// A request against one of the driver's rides, with the rider's contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomingRequest {
    #[serde(flatten)]
    pub request: RideRequest,
    #[serde(flatten)]
    pub trip: TripSummary,
    pub seats_available: i32,
    pub seats_booked: i32,
    pub rider_name: String,
    pub rider_email: String,
}
