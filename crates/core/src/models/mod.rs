pub mod format;
pub mod ride;
pub mod ride_request;
pub mod user;

pub type UserId = i64;
pub type RideId = i64;
pub type RequestId = i64;
