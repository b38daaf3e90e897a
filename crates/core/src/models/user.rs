use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::UserId;
use crate::errors::{BookingError, BookingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Driver,
    Rider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Driver => "driver",
            Role::Rider => "rider",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driver" => Ok(Role::Driver),
            "rider" => Ok(Role::Rider),
            other => Err(BookingError::Validation(format!("Unknown role '{}'", other))),
        }
    }
}

/// The public profile of an account, as shown next to rides and requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// The authenticated identity performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_driver(&self) -> bool {
        self.role == Role::Driver
    }

    pub fn require_driver(&self) -> BookingResult<()> {
        if self.is_driver() {
            Ok(())
        } else {
            Err(BookingError::Forbidden(
                "Access denied. Only drivers can perform this action.".to_string(),
            ))
        }
    }
}

impl From<&UserSummary> for Actor {
    fn from(user: &UserSummary) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }
}
