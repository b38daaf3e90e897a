use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{from_value, json, to_value};
use ridepool_core::{
    errors::BookingError,
    models::{
        format::{parse_date, parse_time},
        ride::{bucket_rides, CreateRideRequest, Ride, RideFilter, RideStatus, RideUpdate},
        ride_request::{RequestStatus, RideRequest},
        user::{Actor, Role},
    },
    search::{BookingSearch, PageMeta, Pagination, RideSearch},
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn ride(id: i64, ride_date: NaiveDate, ride_time: NaiveTime) -> Ride {
    let created_at = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
    Ride {
        id,
        driver_id: 1,
        vehicle_name: "Corolla".to_string(),
        vehicle_number: "KA-01-1234".to_string(),
        from_location: "Koramangala".to_string(),
        to_location: "Whitefield".to_string(),
        ride_date,
        ride_time,
        seats_available: 3,
        seats_booked: 0,
        notes: None,
        status: RideStatus::Active,
        created_at,
        updated_at: created_at,
    }
}

fn valid_input() -> CreateRideRequest {
    CreateRideRequest {
        vehicle_name: Some("  Corolla ".to_string()),
        vehicle_number: Some("KA-01-1234".to_string()),
        from_location: Some("Koramangala".to_string()),
        to_location: Some("Whitefield".to_string()),
        ride_date: Some("2025-06-01".to_string()),
        ride_time: Some("08:30".to_string()),
        seats_available: Some(json!(3)),
        notes: Some("   ".to_string()),
    }
}

fn now() -> NaiveDateTime {
    date(2025, 6, 10).and_time(time(12, 0))
}

#[test]
fn test_create_ride_validation_accepts_and_trims() {
    let new_ride = valid_input().validate(7).expect("valid input should pass");

    assert_eq!(new_ride.driver_id, 7);
    assert_eq!(new_ride.vehicle_name, "Corolla");
    assert_eq!(new_ride.ride_date, date(2025, 6, 1));
    assert_eq!(new_ride.ride_time, time(8, 30));
    assert_eq!(new_ride.seats_available, 3);
    assert_eq!(new_ride.notes, None);
}

#[test]
fn test_create_ride_validation_lists_missing_fields() {
    let input = CreateRideRequest {
        vehicle_number: Some("".to_string()),
        ride_time: None,
        seats_available: None,
        ..valid_input()
    };

    match input.validate(7) {
        Err(BookingError::Validation(msg)) => assert_eq!(
            msg,
            "Missing required fields: vehicle_number, ride_time, seats_available"
        ),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[rstest]
#[case(json!(0))]
#[case(json!(-2))]
#[case(json!(2.5))]
#[case(json!("3"))]
#[case(json!(true))]
fn test_create_ride_rejects_bad_seat_counts(#[case] seats: serde_json::Value) {
    let input = CreateRideRequest {
        seats_available: Some(seats),
        ..valid_input()
    };

    match input.validate(7) {
        Err(BookingError::Validation(msg)) => {
            assert_eq!(msg, "seats_available must be a whole number greater than 0")
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_create_ride_rejects_malformed_date() {
    let input = CreateRideRequest {
        ride_date: Some("01/06/2025".to_string()),
        ..valid_input()
    };

    assert!(matches!(input.validate(7), Err(BookingError::Validation(_))));
}

#[rstest]
#[case("08:30", time(8, 30))]
#[case("08:30:45", time(8, 30))]
#[case(" 23:05 ", time(23, 5))]
fn test_parse_time_truncates_seconds(#[case] raw: &str, #[case] expected: NaiveTime) {
    assert_eq!(parse_time(raw).unwrap(), expected);
}

#[test]
fn test_parse_date_rejects_garbage() {
    assert!(parse_date("2025-13-40").is_err());
    assert_eq!(parse_date("2025-02-28").unwrap(), date(2025, 2, 28));
}

#[test]
fn test_ride_serialization() {
    let ride = ride(5, date(2025, 6, 1), time(8, 30));

    let value = to_value(&ride).expect("Failed to serialize ride");
    assert_eq!(value["ride_date"], json!("2025-06-01"));
    assert_eq!(value["ride_time"], json!("08:30"));
    assert_eq!(value["status"], json!("active"));

    let deserialized: Ride = from_value(value).expect("Failed to deserialize ride");
    assert_eq!(deserialized, ride);
}

#[test]
fn test_ride_seat_counter() {
    let mut ride = ride(1, date(2025, 6, 1), time(8, 30));
    ride.seats_available = 1;

    assert!(ride.book_seat().is_ok());
    assert_eq!(ride.remaining_seats(), 0);
    assert!(matches!(ride.book_seat(), Err(BookingError::Capacity(_))));
    assert_eq!(ride.seats_booked, 1);

    assert!(ride.release_seat());
    assert!(!ride.release_seat());
    assert_eq!(ride.seats_booked, 0);
}

#[test]
fn test_request_serialization_carries_status_and_decision_time() {
    let requested_at = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
    let decided_at = Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap();
    let mut request = RideRequest::new_pending(3, 5, 9, requested_at);

    let pending = to_value(&request).unwrap();
    assert_eq!(pending["status"], json!("pending"));
    assert_eq!(pending["approved_at"], json!(null));
    assert_eq!(pending["rejected_at"], json!(null));

    request.approve(decided_at);
    let approved = to_value(&request).unwrap();
    assert_eq!(approved["status"], json!("approved"));
    assert!(approved["approved_at"].is_string());
    assert_eq!(approved["rejected_at"], json!(null));

    request.reject(decided_at);
    assert_eq!(request.status(), RequestStatus::Rejected);
    assert_eq!(request.approved_at(), None);
    assert_eq!(request.rejected_at(), Some(decided_at));

    let deserialized: RideRequest = from_value(to_value(&request).unwrap()).unwrap();
    assert_eq!(deserialized, request);
}

#[test]
fn test_request_with_both_decision_times_is_refused() {
    let raw = json!({
        "id": 1,
        "ride_id": 2,
        "rider_id": 3,
        "status": "approved",
        "requested_at": "2025-06-01T10:00:00Z",
        "approved_at": "2025-06-01T11:00:00Z",
        "rejected_at": "2025-06-01T12:00:00Z"
    });

    assert!(from_value::<RideRequest>(raw).is_err());
}

#[rstest]
#[case(Some("pending"), Some(RequestStatus::Pending))]
#[case(Some("APPROVED"), Some(RequestStatus::Approved))]
#[case(Some("accepted"), Some(RequestStatus::Approved))]
#[case(Some("rejected"), Some(RequestStatus::Rejected))]
#[case(Some("whatever"), None)]
#[case(Some("all"), None)]
#[case(None, None)]
fn test_status_filter_parsing(#[case] raw: Option<&str>, #[case] expected: Option<RequestStatus>) {
    assert_eq!(RequestStatus::parse_filter(raw), expected);
}

#[rstest]
#[case(Some("upcoming"), RideFilter::Upcoming)]
#[case(Some("Completed"), RideFilter::Completed)]
#[case(Some("all"), RideFilter::All)]
#[case(Some("bogus"), RideFilter::All)]
#[case(None, RideFilter::All)]
fn test_ride_filter_parsing(#[case] raw: Option<&str>, #[case] expected: RideFilter) {
    assert_eq!(RideFilter::parse(raw), expected);
}

#[rstest]
#[case::same_minute_as_now(date(2025, 6, 10), time(12, 0), (12, 0, 45), RideStatus::Active, true, false)]
#[case::minute_before_now(date(2025, 6, 10), time(11, 59), (12, 0, 0), RideStatus::Active, false, false)]
#[case::later_today(date(2025, 6, 10), time(12, 1), (12, 0, 59), RideStatus::Active, true, false)]
#[case::tomorrow_early(date(2025, 6, 11), time(0, 0), (23, 59, 59), RideStatus::Active, true, false)]
#[case::yesterday(date(2025, 6, 9), time(23, 59), (0, 0, 0), RideStatus::Active, false, true)]
#[case::cancelled_future(date(2025, 6, 20), time(9, 0), (12, 0, 0), RideStatus::Cancelled, false, false)]
#[case::cancelled_past(date(2025, 6, 1), time(9, 0), (12, 0, 0), RideStatus::Cancelled, false, false)]
fn test_ride_buckets_at_minute_granularity(
    #[case] ride_date: NaiveDate,
    #[case] ride_time: NaiveTime,
    #[case] clock: (u32, u32, u32),
    #[case] status: RideStatus,
    #[case] upcoming: bool,
    #[case] completed: bool,
) {
    let (h, m, s) = clock;
    let now = date(2025, 6, 10).and_hms_opt(h, m, s).unwrap();
    let mut ride = ride(1, ride_date, ride_time);
    ride.status = status;

    assert_eq!(ride.is_upcoming(now), upcoming);
    assert_eq!(ride.is_completed(now), completed);
}

#[test]
fn test_bucket_rides_orders_each_bucket() {
    let mut cancelled = ride(5, date(2025, 6, 20), time(9, 0));
    cancelled.status = RideStatus::Cancelled;
    let rides = vec![
        ride(1, date(2025, 6, 1), time(8, 0)),
        ride(2, date(2025, 6, 5), time(8, 0)),
        ride(3, date(2025, 6, 10), time(13, 0)),
        ride(4, date(2025, 6, 12), time(7, 0)),
        cancelled,
        // Earlier today: neither upcoming nor completed.
        ride(6, date(2025, 6, 10), time(9, 0)),
    ];

    let upcoming = bucket_rides(rides.clone(), RideFilter::Upcoming, now());
    let ids: Vec<i64> = upcoming.rides.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 4]);

    let completed = bucket_rides(rides.clone(), RideFilter::Completed, now());
    let ids: Vec<i64> = completed.rides.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 1]);

    let all = bucket_rides(rides, RideFilter::All, now());
    assert_eq!(all.rides.len(), 6);
    assert_eq!(all.counts.all, 6);
    assert_eq!(all.counts.upcoming, 2);
    assert_eq!(all.counts.completed, 2);
}

#[test]
fn test_ride_update_validation() {
    let mut current = ride(1, date(2025, 6, 1), time(8, 30));
    current.seats_booked = 2;

    let shrink_below_booked = RideUpdate {
        seats_available: Some(1),
        ..RideUpdate::default()
    };
    assert!(matches!(
        shrink_below_booked.validate_against(&current),
        Err(BookingError::Validation(_))
    ));

    let blank_name = RideUpdate {
        vehicle_name: Some("  ".to_string()),
        ..RideUpdate::default()
    };
    assert!(blank_name.validate_against(&current).is_err());

    let fine = RideUpdate {
        seats_available: Some(4),
        notes: Some("AC car".to_string()),
        ..RideUpdate::default()
    };
    assert!(fine.validate_against(&current).is_ok());
    assert!(RideUpdate::default().is_empty());
    assert!(!fine.is_empty());

    fine.apply(&mut current);
    assert_eq!(current.seats_available, 4);
    assert_eq!(current.notes.as_deref(), Some("AC car"));
}

#[test]
fn test_ride_update_deserializes_partial_body() {
    let update: RideUpdate = from_value(json!({
        "ride_time": "18:45:10",
        "status": "cancelled"
    }))
    .unwrap();

    assert_eq!(update.ride_time, Some(time(18, 45)));
    assert_eq!(update.status, Some(RideStatus::Cancelled));
    assert_eq!(update.vehicle_name, None);
}

#[rstest]
#[case(None, None, 1, 20)]
#[case(Some(0), Some(0), 1, 1)]
#[case(Some(-4), Some(500), 1, 100)]
#[case(Some(3), Some(10), 3, 10)]
fn test_pagination_clamps(
    #[case] page: Option<i64>,
    #[case] limit: Option<i64>,
    #[case] expected_page: u32,
    #[case] expected_limit: u32,
) {
    let pagination = Pagination::new(page, limit);
    assert_eq!(pagination.page, expected_page);
    assert_eq!(pagination.limit, expected_limit);
}

#[test]
fn test_pagination_window_and_meta() {
    let pagination = Pagination::new(Some(2), Some(2));
    assert_eq!(pagination.offset(), 2);
    assert_eq!(pagination.apply(vec![1, 2, 3, 4, 5]), vec![3, 4]);

    let meta = PageMeta::new(pagination, 5);
    assert_eq!(meta.total_pages, 3);
    assert_eq!(
        to_value(meta).unwrap(),
        json!({"page": 2, "limit": 2, "total": 5, "totalPages": 3})
    );
    assert_eq!(PageMeta::new(pagination, 0).total_pages, 0);
}

#[test]
fn test_ride_search_matching() {
    let mut candidate = ride(1, date(2025, 6, 1), time(8, 30));
    candidate.ride_time = NaiveTime::from_hms_opt(8, 30, 59).unwrap();

    let search = RideSearch {
        from_location: Some("koRAMan".to_string()),
        ride_date: Some(date(2025, 6, 1)),
        ride_time: Some(time(8, 30)),
        ..RideSearch::default()
    };
    assert!(search.matches(&candidate));

    let wrong_time = RideSearch {
        ride_time: Some(time(8, 31)),
        ..search.clone()
    };
    assert!(!wrong_time.matches(&candidate));

    candidate.seats_booked = candidate.seats_available;
    assert!(!search.matches(&candidate));

    candidate.seats_booked = 0;
    candidate.status = RideStatus::Cancelled;
    assert!(!search.matches(&candidate));
}

#[test]
fn test_booking_search_date_range() {
    let trip = ride(1, date(2025, 6, 15), time(8, 30));
    let requested_at = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
    let request = RideRequest::new_pending(1, trip.id, 9, requested_at);

    let mut search = BookingSearch::new(9);
    search.from_date = Some(date(2025, 6, 15));
    search.to_date = Some(date(2025, 6, 15));
    assert!(search.matches(&request, &trip));

    search.status = Some(RequestStatus::Approved);
    assert!(!search.matches(&request, &trip));

    assert!(!BookingSearch::new(10).matches(&request, &trip));
}

#[test]
fn test_role_and_actor() {
    assert_eq!("driver".parse::<Role>().unwrap(), Role::Driver);
    assert!("admin".parse::<Role>().is_err());

    assert!(Actor::new(1, Role::Driver).require_driver().is_ok());
    match Actor::new(2, Role::Rider).require_driver() {
        Err(BookingError::Forbidden(msg)) => {
            assert_eq!(msg, "Access denied. Only drivers can perform this action.")
        }
        other => panic!("expected forbidden, got {:?}", other),
    }
}
