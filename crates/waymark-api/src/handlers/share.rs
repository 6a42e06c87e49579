//! Public, unauthenticated read access to one trip via its share token.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use waymark_core::{LocationRepository, LocationWithTags, TripRepository, UserRepository};

use crate::error::ApiResult;
use crate::state::AppState;

/// Sanitized public view: no owner ids, no share token echo.
#[derive(Serialize)]
pub struct PublicTrip {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub locations: Vec<LocationWithTags>,
}

pub async fn public_trip(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<PublicTrip>> {
    let trip = state.db.trips.get_by_share_token(&token).await?;
    let locations = state.db.locations.list_for_trip(trip.id).await?;
    let created_by = state
        .db
        .users
        .get(trip.user_id)
        .await
        .ok()
        .and_then(|u| u.display_name);

    Ok(Json(PublicTrip {
        id: trip.id,
        title: trip.title,
        description: trip.description,
        created_by,
        locations,
    }))
}
