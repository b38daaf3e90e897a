//! # Ridepool Core
//!
//! Domain model and booking rules for the ride-sharing marketplace.
//!
//! - **models**: rides, ride requests and the users that own them
//! - **search**: filters, pagination and listing shapes for read paths
//! - **store**: the persistence contract the engine runs against
//! - **booking**: the engine that sequences every capacity-changing operation
//!
//! Nothing in this crate talks to a database or the network directly.

pub mod booking;
pub mod errors;
pub mod models;
pub mod search;
pub mod store;

pub use booking::{BookingEngine, Transition};
pub use errors::{BookingError, BookingResult};
