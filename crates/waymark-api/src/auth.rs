//! API-key authentication extractors.
//!
//! Requests carry `Authorization: Bearer <key>`. Keys resolve to users
//! through the database; the final equality check is constant-time so a
//! timing oracle cannot distinguish near-miss keys.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use subtle::ConstantTimeEq;

use waymark_core::{Error, User, UserRepository};

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller.
pub struct AuthUser(pub User);

/// Authenticated caller with the admin flag set.
pub struct AdminUser(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<User, ApiError> {
    let token = bearer_token(parts)
        .ok_or_else(|| Error::Unauthorized("Missing API key".to_string()))?;

    let user = state
        .db
        .users
        .find_by_api_key(token)
        .await?
        .ok_or_else(|| Error::Unauthorized("Invalid API key".to_string()))?;

    // The index lookup already matched; this keeps the final comparison
    // constant-time regardless of where the candidate diverges.
    if user.api_key.as_bytes().ct_eq(token.as_bytes()).unwrap_u8() != 1 {
        return Err(Error::Unauthorized("Invalid API key".to_string()).into());
    }

    Ok(user)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(AuthUser(authenticate(parts, state).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        if !user.is_admin {
            return Err(Error::Forbidden("Admin access required".to_string()).into());
        }
        Ok(AdminUser(user))
    }
}
