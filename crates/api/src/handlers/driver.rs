use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use ridepool_core::{
    booking::Transition,
    models::{
        ride::{BucketCounts, CreateRideRequest, Ride, RideFilter, RideUpdate},
        ride_request::RequestStatus,
    },
    search::{DriverRequestSearch, IncomingRequest, PageMeta},
};
use serde::{Deserialize, Serialize};

use super::{pagination, parse_id, text, ApiResponse};
use crate::{
    middleware::{auth::DriverUser, error_handling::AppError},
    ApiState,
};

#[derive(Debug, Deserialize)]
pub struct RidesQuery {
    pub filter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RideCounts {
    pub counts: BucketCounts,
}

pub async fn list_rides(
    State(state): State<Arc<ApiState>>,
    user: DriverUser,
    Query(query): Query<RidesQuery>,
) -> Result<Json<ApiResponse<Vec<Ride>, RideCounts>>, AppError> {
    let filter = RideFilter::parse(query.filter.as_deref());
    let listing = state.engine.list_driver_rides(&user.actor(), filter).await?;

    Ok(Json(
        ApiResponse::ok(listing.rides).with_meta(RideCounts {
            counts: listing.counts,
        }),
    ))
}

pub async fn create_ride(
    State(state): State<Arc<ApiState>>,
    user: DriverUser,
    payload: Result<Json<CreateRideRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Ride>>), AppError> {
    let Json(payload) = payload?;
    let ride = state.engine.create_ride(&user.actor(), payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(ride).with_message("Ride created successfully")),
    ))
}

pub async fn update_ride(
    State(state): State<Arc<ApiState>>,
    user: DriverUser,
    Path(ride_id): Path<String>,
    payload: Result<Json<RideUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<Option<Ride>>>, AppError> {
    let ride_id = parse_id(&ride_id, "Invalid ride ID")?;
    let Json(payload) = payload?;
    let updated = state
        .engine
        .update_ride(&user.actor(), ride_id, payload)
        .await?;

    let message = if updated.is_some() {
        "Ride updated successfully"
    } else {
        "No changes to apply"
    };
    Ok(Json(ApiResponse::ok(updated).with_message(message)))
}

pub async fn cancel_ride(
    State(state): State<Arc<ApiState>>,
    user: DriverUser,
    Path(ride_id): Path<String>,
) -> Result<Json<ApiResponse<Ride>>, AppError> {
    let ride_id = parse_id(&ride_id, "Invalid ride ID")?;
    let ride = state.engine.cancel_ride(&user.actor(), ride_id).await?;

    Ok(Json(
        ApiResponse::ok(ride).with_message("Ride cancelled successfully"),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RequestsQuery {
    pub ride_id: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

pub async fn list_requests(
    State(state): State<Arc<ApiState>>,
    user: DriverUser,
    Query(query): Query<RequestsQuery>,
) -> Result<Json<ApiResponse<Vec<IncomingRequest>, PageMeta>>, AppError> {
    let ride_id = text(&query.ride_id)
        .map(|raw| parse_id(&raw, "Invalid ride_id parameter"))
        .transpose()?;
    let search = DriverRequestSearch {
        ride_id,
        status: RequestStatus::parse_filter(query.status.as_deref()),
        pagination: pagination(&query.page, &query.limit),
        ..DriverRequestSearch::new(user.id())
    };
    let window = search.pagination;

    let page = state.engine.driver_requests(&user.actor(), search).await?;

    Ok(Json(
        ApiResponse::ok(page.items).with_meta(PageMeta::new(window, page.total)),
    ))
}

pub async fn approve_request(
    State(state): State<Arc<ApiState>>,
    user: DriverUser,
    Path(request_id): Path<String>,
) -> Result<Json<ApiResponse<Transition>>, AppError> {
    let request_id = parse_id(&request_id, "Invalid request ID")?;
    let transition = state
        .engine
        .approve_request(&user.actor(), request_id)
        .await?;

    Ok(Json(
        ApiResponse::ok(transition).with_message("Ride request approved successfully"),
    ))
}

pub async fn reject_request(
    State(state): State<Arc<ApiState>>,
    user: DriverUser,
    Path(request_id): Path<String>,
) -> Result<Json<ApiResponse<Transition>>, AppError> {
    let request_id = parse_id(&request_id, "Invalid request ID")?;
    let transition = state
        .engine
        .reject_request(&user.actor(), request_id)
        .await?;

    Ok(Json(
        ApiResponse::ok(transition).with_message("Ride request rejected successfully"),
    ))
}
