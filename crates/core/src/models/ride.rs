use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    format::{self, truncate_to_minute},
    RideId, UserId,
};
use crate::errors::{BookingError, BookingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Active,
    Cancelled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Active => "active",
            RideStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RideStatus::Active),
            "cancelled" => Ok(RideStatus::Cancelled),
            other => Err(BookingError::Validation(format!(
                "Unknown ride status '{}'",
                other
            ))),
        }
    }
}

/// A driver's offer of a trip with a fixed number of seats.
///
/// `seats_booked` counts approved requests and always stays within
/// `0..=seats_available`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ride {
    pub id: RideId,
    pub driver_id: UserId,
    pub vehicle_name: String,
    pub vehicle_number: String,
    pub from_location: String,
    pub to_location: String,
    #[serde(with = "format::date")]
    pub ride_date: NaiveDate,
    #[serde(with = "format::time")]
    pub ride_time: NaiveTime,
    pub seats_available: i32,
    pub seats_booked: i32,
    pub notes: Option<String>,
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    pub fn remaining_seats(&self) -> i32 {
        (self.seats_available - self.seats_booked).max(0)
    }

    pub fn has_free_seat(&self) -> bool {
        self.remaining_seats() > 0
    }

    pub fn is_active(&self) -> bool {
        self.status == RideStatus::Active
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.driver_id == user_id
    }

    /// Takes one seat, refusing when none remain.
    pub fn book_seat(&mut self) -> BookingResult<()> {
        if !self.has_free_seat() {
            return Err(BookingError::Capacity(
                "No seats available for this ride".to_string(),
            ));
        }
        self.seats_booked += 1;
        Ok(())
    }

    /// Gives one seat back. Returns false when nothing was booked.
    pub fn release_seat(&mut self) -> bool {
        if self.seats_booked > 0 {
            self.seats_booked -= 1;
            true
        } else {
            false
        }
    }

    pub fn departure(&self) -> NaiveDateTime {
        self.ride_date.and_time(truncate_to_minute(self.ride_time))
    }

    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        if self.status == RideStatus::Cancelled {
            return false;
        }
        let today = now.date();
        self.ride_date > today
            || (self.ride_date == today
                && truncate_to_minute(self.ride_time) >= truncate_to_minute(now.time()))
    }

    pub fn is_completed(&self, now: NaiveDateTime) -> bool {
        self.status != RideStatus::Cancelled && self.ride_date < now.date()
    }
}

/// Ride details as submitted by a driver, before validation.
///
/// `seats_available` is kept as raw JSON so that strings, fractions and
/// other non-integers are reported as validation failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRideRequest {
    pub vehicle_name: Option<String>,
    pub vehicle_number: Option<String>,
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub ride_date: Option<String>,
    pub ride_time: Option<String>,
    pub seats_available: Option<Value>,
    pub notes: Option<String>,
}

/// A validated ride, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRide {
    pub driver_id: UserId,
    pub vehicle_name: String,
    pub vehicle_number: String,
    pub from_location: String,
    pub to_location: String,
    pub ride_date: NaiveDate,
    pub ride_time: NaiveTime,
    pub seats_available: i32,
    pub notes: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CreateRideRequest {
    pub fn validate(self, driver_id: UserId) -> BookingResult<NewRide> {
        let text_fields = [
            ("vehicle_name", &self.vehicle_name),
            ("vehicle_number", &self.vehicle_number),
            ("from_location", &self.from_location),
            ("to_location", &self.to_location),
            ("ride_date", &self.ride_date),
            ("ride_time", &self.ride_time),
        ];
        let mut missing: Vec<&str> = text_fields
            .iter()
            .filter(|(_, value)| present(value).is_none())
            .map(|(name, _)| *name)
            .collect();
        if self.seats_available.as_ref().map_or(true, Value::is_null) {
            missing.push("seats_available");
        }
        if !missing.is_empty() {
            return Err(BookingError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let seats_available = self
            .seats_available
            .as_ref()
            .and_then(Value::as_i64)
            .filter(|seats| *seats >= 1)
            .and_then(|seats| i32::try_from(seats).ok())
            .ok_or_else(|| {
                BookingError::Validation(
                    "seats_available must be a whole number greater than 0".to_string(),
                )
            })?;

        let text = |value: &Option<String>| present(value).unwrap_or_default().to_string();

        Ok(NewRide {
            driver_id,
            vehicle_name: text(&self.vehicle_name),
            vehicle_number: text(&self.vehicle_number),
            from_location: text(&self.from_location),
            to_location: text(&self.to_location),
            ride_date: format::parse_date(present(&self.ride_date).unwrap_or_default())?,
            ride_time: format::parse_time(present(&self.ride_time).unwrap_or_default())?,
            seats_available,
            notes: present(&self.notes).map(str::to_string),
        })
    }
}

/// Partial update of the mutable ride fields. Absent fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideUpdate {
    #[serde(default)]
    pub vehicle_name: Option<String>,
    #[serde(default)]
    pub vehicle_number: Option<String>,
    #[serde(default)]
    pub from_location: Option<String>,
    #[serde(default)]
    pub to_location: Option<String>,
    #[serde(default)]
    pub ride_date: Option<NaiveDate>,
    #[serde(default, with = "format::option_time")]
    pub ride_time: Option<NaiveTime>,
    #[serde(default)]
    pub seats_available: Option<i32>,
    #[serde(default)]
    pub seats_booked: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<RideStatus>,
}

impl RideUpdate {
    pub fn is_empty(&self) -> bool {
        self == &RideUpdate::default()
    }

    /// Checks that applying this update to `ride` keeps it well formed.
    pub fn validate_against(&self, ride: &Ride) -> BookingResult<()> {
        let text_fields = [
            ("vehicle_name", &self.vehicle_name),
            ("vehicle_number", &self.vehicle_number),
            ("from_location", &self.from_location),
            ("to_location", &self.to_location),
        ];
        for (name, value) in text_fields {
            if value.is_some() && present(value).is_none() {
                return Err(BookingError::Validation(format!("{} cannot be empty", name)));
            }
        }

        let (available, booked) = self.resulting_counters(ride);
        if available < 1 {
            return Err(BookingError::Validation(
                "seats_available must be a whole number greater than 0".to_string(),
            ));
        }
        if booked < 0 || booked > available {
            return Err(BookingError::Validation(format!(
                "seats_booked must stay between 0 and {}",
                available
            )));
        }
        Ok(())
    }

    /// Seat counters `ride` would carry after this update.
    pub fn resulting_counters(&self, ride: &Ride) -> (i32, i32) {
        (
            self.seats_available.unwrap_or(ride.seats_available),
            self.seats_booked.unwrap_or(ride.seats_booked),
        )
    }

    /// Whether the resulting counters keep `0 <= booked <= available` and `available >= 1`.
    pub fn counters_fit(&self, ride: &Ride) -> bool {
        let (available, booked) = self.resulting_counters(ride);
        available >= 1 && (0..=available).contains(&booked)
    }

    pub fn apply(&self, ride: &mut Ride) {
        let trimmed = |value: &Option<String>| present(value).map(str::to_string);
        if let Some(v) = trimmed(&self.vehicle_name) {
            ride.vehicle_name = v;
        }
        if let Some(v) = trimmed(&self.vehicle_number) {
            ride.vehicle_number = v;
        }
        if let Some(v) = trimmed(&self.from_location) {
            ride.from_location = v;
        }
        if let Some(v) = trimmed(&self.to_location) {
            ride.to_location = v;
        }
        if let Some(v) = self.ride_date {
            ride.ride_date = v;
        }
        if let Some(v) = self.ride_time {
            ride.ride_time = v;
        }
        if let Some(v) = self.seats_available {
            ride.seats_available = v;
        }
        if let Some(v) = self.seats_booked {
            ride.seats_booked = v;
        }
        if let Some(notes) = &self.notes {
            ride.notes = Some(notes.trim().to_string()).filter(|n| !n.is_empty());
        }
        if let Some(v) = self.status {
            ride.status = v;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideFilter {
    #[default]
    All,
    Upcoming,
    Completed,
}

impl RideFilter {
    /// Unknown or missing values fall back to `All`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("upcoming") => RideFilter::Upcoming,
            Some("completed") => RideFilter::Completed,
            _ => RideFilter::All,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketCounts {
    pub all: usize,
    pub upcoming: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriverRides {
    pub rides: Vec<Ride>,
    pub counts: BucketCounts,
}

/// Splits a driver's rides into display buckets as seen at `now`.
///
/// Upcoming rides come soonest first, completed rides most recent first;
/// `All` keeps the incoming order.
pub fn bucket_rides(rides: Vec<Ride>, filter: RideFilter, now: NaiveDateTime) -> DriverRides {
    let counts = BucketCounts {
        all: rides.len(),
        upcoming: rides.iter().filter(|r| r.is_upcoming(now)).count(),
        completed: rides.iter().filter(|r| r.is_completed(now)).count(),
    };

    let rides = match filter {
        RideFilter::All => rides,
        RideFilter::Upcoming => {
            let mut upcoming: Vec<Ride> = rides.into_iter().filter(|r| r.is_upcoming(now)).collect();
            upcoming.sort_by_key(Ride::departure);
            upcoming
        }
        RideFilter::Completed => {
            let mut completed: Vec<Ride> =
                rides.into_iter().filter(|r| r.is_completed(now)).collect();
            completed.sort_by_key(|r| std::cmp::Reverse(r.departure()));
            completed
        }
    };

    DriverRides { rides, counts }
}
