use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use eyre::eyre;
use serde::{Deserialize, Serialize};

use super::{RequestId, RideId, UserId};
use crate::errors::{BookingError, BookingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Lenient parsing for query filters: case-insensitive, `accepted` means
    /// `approved`, and anything unrecognised means "no filter".
    pub fn parse_filter(raw: Option<&str>) -> Option<Self> {
        let normalized = raw?.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "accepted" => Some(RequestStatus::Approved),
            other => other.parse().ok(),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(BookingError::Validation(format!(
                "Unknown request status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    Approved,
    Rejected,
}

/// The driver's latest verdict on a request and when it was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub outcome: DecisionOutcome,
    pub at: DateTime<Utc>,
}

/// A rider's claim on a seat in a ride.
///
/// A request without a decision is pending. Approving and rejecting replace
/// the decision, so an approval time and a rejection time never coexist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RequestRecord", try_from = "RequestRecord")]
pub struct RideRequest {
    pub id: RequestId,
    pub ride_id: RideId,
    pub rider_id: UserId,
    pub requested_at: DateTime<Utc>,
    pub decision: Option<Decision>,
}

impl RideRequest {
    pub fn new_pending(
        id: RequestId,
        ride_id: RideId,
        rider_id: UserId,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            ride_id,
            rider_id,
            requested_at,
            decision: None,
        }
    }

    pub fn status(&self) -> RequestStatus {
        match self.decision {
            None => RequestStatus::Pending,
            Some(Decision {
                outcome: DecisionOutcome::Approved,
                ..
            }) => RequestStatus::Approved,
            Some(Decision {
                outcome: DecisionOutcome::Rejected,
                ..
            }) => RequestStatus::Rejected,
        }
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.decision
            .filter(|d| d.outcome == DecisionOutcome::Approved)
            .map(|d| d.at)
    }

    pub fn rejected_at(&self) -> Option<DateTime<Utc>> {
        self.decision
            .filter(|d| d.outcome == DecisionOutcome::Rejected)
            .map(|d| d.at)
    }

    pub fn approve(&mut self, at: DateTime<Utc>) {
        self.decision = Some(Decision {
            outcome: DecisionOutcome::Approved,
            at,
        });
    }

    pub fn reject(&mut self, at: DateTime<Utc>) {
        self.decision = Some(Decision {
            outcome: DecisionOutcome::Rejected,
            at,
        });
    }
}

/// Flat shape of a request as stored and as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: RequestId,
    pub ride_id: RideId,
    pub rider_id: UserId,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

impl From<RideRequest> for RequestRecord {
    fn from(request: RideRequest) -> Self {
        Self {
            id: request.id,
            ride_id: request.ride_id,
            rider_id: request.rider_id,
            status: request.status(),
            requested_at: request.requested_at,
            approved_at: request.approved_at(),
            rejected_at: request.rejected_at(),
        }
    }
}

impl TryFrom<RequestRecord> for RideRequest {
    type Error = BookingError;

    fn try_from(record: RequestRecord) -> BookingResult<Self> {
        let decision = match (record.status, record.approved_at, record.rejected_at) {
            (RequestStatus::Pending, None, None) => None,
            (RequestStatus::Approved, Some(at), None) => Some(Decision {
                outcome: DecisionOutcome::Approved,
                at,
            }),
            (RequestStatus::Rejected, None, Some(at)) => Some(Decision {
                outcome: DecisionOutcome::Rejected,
                at,
            }),
            (status, approved_at, rejected_at) => {
                return Err(BookingError::Database(eyre!(
                    "ride request {} is {} with approved_at={:?} rejected_at={:?}",
                    record.id,
                    status,
                    approved_at,
                    rejected_at
                )));
            }
        };

        Ok(Self {
            id: record.id,
            ride_id: record.ride_id,
            rider_id: record.rider_id,
            requested_at: record.requested_at,
            decision,
        })
    }
}
