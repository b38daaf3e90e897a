use std::error::Error;
use ridepool_core::errors::{BookingError, BookingResult};

#[test]
fn test_booking_error_display() {
    let validation = BookingError::Validation("Missing required fields: ride_date".to_string());
    let not_found = BookingError::NotFound("Ride not found".to_string());
    let authentication = BookingError::Authentication("Invalid token".to_string());
    let forbidden = BookingError::Forbidden("Not your ride".to_string());
    let invalid_state = BookingError::InvalidState("Request is already approved".to_string());
    let capacity = BookingError::Capacity("No seats available for this ride".to_string());
    let duplicate = BookingError::Duplicate("Already requested".to_string());
    let database = BookingError::Database(eyre::eyre!("Database connection failed"));
    let internal = BookingError::Internal(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        "Internal error",
    )));

    assert_eq!(
        validation.to_string(),
        "Validation error: Missing required fields: ride_date"
    );
    assert_eq!(not_found.to_string(), "Resource not found: Ride not found");
    assert_eq!(
        authentication.to_string(),
        "Authentication error: Invalid token"
    );
    assert_eq!(forbidden.to_string(), "Forbidden: Not your ride");
    assert_eq!(
        invalid_state.to_string(),
        "Invalid state: Request is already approved"
    );
    assert_eq!(
        capacity.to_string(),
        "Capacity error: No seats available for this ride"
    );
    assert_eq!(duplicate.to_string(), "Duplicate: Already requested");
    assert!(database.to_string().contains("Database error:"));
    assert!(internal.to_string().contains("Internal server error:"));
}

#[test]
fn test_user_message_hides_internal_details() {
    let capacity = BookingError::Capacity("No seats available for this ride".to_string());
    let database = BookingError::Database(eyre::eyre!("connection refused on 10.0.0.3"));

    assert_eq!(capacity.user_message(), "No seats available for this ride");
    assert_eq!(database.user_message(), "Internal server error");
}

#[test]
fn test_is_expected() {
    assert!(BookingError::Duplicate("dup".to_string()).is_expected());
    assert!(BookingError::InvalidState("state".to_string()).is_expected());
    assert!(!BookingError::Database(eyre::eyre!("boom")).is_expected());

    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "IO error");
    assert!(!BookingError::Internal(Box::new(io_error)).is_expected());
}

#[test]
fn test_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "IO error");
    let booking_error = BookingError::Internal(Box::new(io_error));

    assert!(booking_error.source().is_some());
}

#[test]
fn test_from_eyre_report() {
    fn fails() -> BookingResult<()> {
        let decoded: eyre::Result<()> = Err(eyre::eyre!("row decode failed"));
        decoded?;
        Ok(())
    }

    let err = fails().unwrap_err();
    assert!(matches!(err, BookingError::Database(_)));
    assert!(err.to_string().contains("row decode failed"));
}

#[test]
fn test_booking_result() {
    let result: BookingResult<i32> = Ok(42);
    assert_eq!(result.unwrap(), 42);

    let result: BookingResult<i32> = Err(BookingError::NotFound("Not found".to_string()));
    assert!(result.is_err());
}
