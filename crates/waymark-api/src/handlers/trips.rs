//! Trip CRUD handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use waymark_core::{
    CreateTripRequest, LocationRepository, LocationWithTags, Trip, TripRepository, TripSummary,
    UpdateTripRequest,
};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct TripDetail {
    #[serde(flatten)]
    pub trip: Trip,
    pub locations: Vec<LocationWithTags>,
}

pub async fn list_trips(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<TripSummary>>> {
    Ok(Json(state.db.trips.list(user.id).await?))
}

pub async fn create_trip(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateTripRequest>,
) -> ApiResult<Json<Trip>> {
    Ok(Json(state.db.trips.create(user.id, req).await?))
}

pub async fn get_trip(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TripDetail>> {
    let trip = state.db.trips.get(id, user.id).await?;
    let locations = state.db.locations.list_for_trip(trip.id).await?;
    Ok(Json(TripDetail { trip, locations }))
}

pub async fn update_trip(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTripRequest>,
) -> ApiResult<Json<Trip>> {
    Ok(Json(state.db.trips.update(id, user.id, req).await?))
}

pub async fn delete_trip(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    state.db.trips.delete(id, user.id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
