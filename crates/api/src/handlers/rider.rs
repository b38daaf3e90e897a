use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use ridepool_core::{
    models::{
        format::{parse_date, parse_time},
        ride_request::{RequestStatus, RideRequest},
    },
    search::{BookingListing, BookingSearch, PageMeta, RideListing, RideSearch},
};
use serde::Deserialize;

use super::{pagination, parse_id, text, ApiResponse};
use crate::{
    middleware::{auth::AuthUser, error_handling::AppError},
    ApiState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub ride_date: Option<String>,
    pub ride_time: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

pub async fn search_rides(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<RideListing>, PageMeta>>, AppError> {
    let search = RideSearch {
        from_location: text(&query.from_location),
        to_location: text(&query.to_location),
        ride_date: text(&query.ride_date).as_deref().map(parse_date).transpose()?,
        ride_time: text(&query.ride_time).as_deref().map(parse_time).transpose()?,
        exclude_rider: Some(user.id()),
        pagination: pagination(&query.page, &query.limit),
    };
    let window = search.pagination;

    let page = state.engine.search_available_rides(search).await?;

    Ok(Json(
        ApiResponse::ok(page.items).with_meta(PageMeta::new(window, page.total)),
    ))
}

pub async fn request_seat(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(ride_id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<RideRequest>>), AppError> {
    let ride_id = parse_id(&ride_id, "Invalid ride ID.")?;
    let request = state.engine.request_seat(user.id(), ride_id).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(request))))
}

#[derive(Debug, Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<ApiResponse<Vec<BookingListing>, PageMeta>>, AppError> {
    let search = BookingSearch {
        status: RequestStatus::parse_filter(query.status.as_deref()),
        from_date: text(&query.from_date).as_deref().map(parse_date).transpose()?,
        to_date: text(&query.to_date).as_deref().map(parse_date).transpose()?,
        pagination: pagination(&query.page, &query.limit),
        ..BookingSearch::new(user.id())
    };
    let window = search.pagination;

    let page = state.engine.rider_bookings(search).await?;

    Ok(Json(
        ApiResponse::ok(page.items).with_meta(PageMeta::new(window, page.total)),
    ))
}
