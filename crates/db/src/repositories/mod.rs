pub mod ride;
pub mod ride_request;
pub mod user;
