//! # Authentication Module
//!
//! Bearer-token identity for the API. Tokens are HS256 JWTs carrying the
//! user's id in a `userId` claim. The account behind the id is loaded through
//! the booking store on every request, so a token for a deleted user stops
//! working immediately.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use ridepool_core::{
    errors::BookingError,
    models::{
        user::{Actor, UserSummary},
        UserId,
    },
};
use serde::{Deserialize, Serialize};

use crate::{middleware::error_handling::AppError, ApiState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub exp: usize,
}

/// Signs a token for `user_id` that expires after `ttl`.
pub fn issue_token(user_id: UserId, secret: &str, ttl: Duration) -> eyre::Result<String> {
    let exp = (Utc::now() + ttl).timestamp().max(0) as usize;
    let token = encode(
        &Header::default(),
        &Claims { user_id, exp },
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Verifies signature and expiry.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, BookingError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|err| {
        tracing::debug!("Rejected bearer token: {}", err);
        BookingError::Authentication("Invalid or expired token.".to_string())
    })
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The authenticated caller, resolved from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserSummary);

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor::from(&self.0)
    }

    pub fn id(&self) -> UserId {
        self.0.id
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<ApiState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            BookingError::Authentication("Access denied. No token provided.".to_string())
        })?;
        let claims = verify_token(token, &state.jwt_secret)?;

        let user = state
            .engine
            .store()
            .find_user(claims.user_id)
            .await?
            .ok_or_else(|| BookingError::Authentication("User not found.".to_string()))?;

        Ok(AuthUser(user))
    }
}

/// An authenticated caller whose account has the driver role.
#[derive(Debug, Clone)]
pub struct DriverUser(pub AuthUser);

impl DriverUser {
    pub fn actor(&self) -> Actor {
        self.0.actor()
    }

    pub fn id(&self) -> UserId {
        self.0.id()
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<ApiState>> for DriverUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.actor().require_driver()?;
        Ok(DriverUser(user))
    }
}
