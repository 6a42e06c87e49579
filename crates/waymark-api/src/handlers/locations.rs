//! Location CRUD handlers.
//!
//! The direct creation path geocodes as a fallback when a URL is present
//! without coordinates, and is the one place where unresolvable
//! coordinates are a hard 400.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use waymark_core::{
    CreateLocationRequest, Error, ListTagsRequest, LocationRepository, LocationWithTags,
    TagRepository, TripRepository, UpdateLocationRequest,
};
use waymark_inference::{extract_tags, geocode_from_content};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::{backends, usage};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationBody {
    pub trip_id: Uuid,
    pub source_url: Option<String>,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub url_title: Option<String>,
    pub url_description: Option<String>,
    pub url_image: Option<String>,
    pub notes: Option<String>,
}

pub async fn create_location(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateLocationBody>,
) -> ApiResult<Json<LocationWithTags>> {
    let trip = state.db.trips.get(body.trip_id, user.id).await?;

    let mut name = body.name.clone().unwrap_or_default();
    // Zero coordinates are the placeholder value, never a real place.
    let mut latitude = body.latitude.filter(|v| *v != 0.0);
    let mut longitude = body.longitude.filter(|v| *v != 0.0);
    let mut address = body.address.clone();

    // A URL without coordinates gets one best-effort geocoding pass.
    let needs_geocode =
        body.source_url.is_some() && (latitude.is_none() || longitude.is_none());
    if needs_geocode {
        match backends::generation_backend(&state.db).await? {
            Some(backend) => {
                match geocode_from_content(
                    backend.as_ref(),
                    body.source_url.as_deref().unwrap_or(""),
                    body.url_title.as_deref().unwrap_or(""),
                    body.url_description.as_deref().unwrap_or(""),
                    body.notes.as_deref().unwrap_or(""),
                )
                .await
                {
                    Ok((result, generation)) => {
                        usage::record_generation(&state.db, user.id, None, "geocode", &generation)
                            .await;
                        if name.is_empty() {
                            name = result.name;
                        }
                        if let Some(coordinates) = result.coordinates {
                            latitude = Some(coordinates.lat);
                            longitude = Some(coordinates.lng);
                        }
                        if address.is_none() {
                            address = result.address;
                        }
                    }
                    Err(e) => {
                        warn!(subsystem = "api", op = "create_location", error = %e, "Geocoding fallback failed");
                    }
                }
            }
            None => {
                warn!(
                    subsystem = "api",
                    op = "create_location",
                    "Geocoding fallback unavailable: no generative credential"
                );
            }
        }
    }

    if name.trim().is_empty() {
        return Err(Error::InvalidInput("Location name is required".to_string()).into());
    }
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(Error::InvalidInput(
            "Could not determine location coordinates. Please provide them manually.".to_string(),
        )
        .into());
    };

    let location = state
        .db
        .locations
        .insert(CreateLocationRequest {
            trip_id: trip.id,
            user_id: user.id,
            name,
            latitude,
            longitude,
            address,
            source_url: body.source_url,
            url_title: body.url_title,
            url_description: body.url_description.clone(),
            url_image: body.url_image,
            raw_transcription: body.notes.clone(),
            ..Default::default()
        })
        .await?;

    // Best-effort tagging when there is any text to work from.
    let has_text = body.notes.as_deref().is_some_and(|s| !s.is_empty())
        || body.url_description.as_deref().is_some_and(|s| !s.is_empty());
    if has_text {
        if let Ok(Some(backend)) = backends::generation_backend(&state.db).await {
            let vocabulary = state
                .db
                .tags
                .list(ListTagsRequest::default())
                .await
                .unwrap_or_default();
            match extract_tags(
                backend.as_ref(),
                &location.name,
                body.url_description.as_deref().unwrap_or(""),
                body.notes.as_deref().unwrap_or(""),
                &vocabulary,
            )
            .await
            {
                Ok((suggestions, generation)) => {
                    usage::record_generation(
                        &state.db,
                        user.id,
                        Some(location.id),
                        "extract_tags",
                        &generation,
                    )
                    .await;
                    match state.db.tags.resolve_suggestions(&suggestions).await {
                        Ok(tag_ids) => {
                            if let Err(e) =
                                state.db.tags.attach_to_location(location.id, &tag_ids).await
                            {
                                warn!(subsystem = "api", op = "create_location", error = %e, "Tag attach failed");
                            }
                        }
                        Err(e) => {
                            warn!(subsystem = "api", op = "create_location", error = %e, "Tag resolution failed");
                        }
                    }
                }
                Err(e) => {
                    warn!(subsystem = "api", op = "create_location", error = %e, "Tag extraction failed");
                }
            }
        }
    }

    Ok(Json(state.db.locations.fetch(location.id, user.id).await?))
}

pub async fn list_locations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<LocationWithTags>>> {
    Ok(Json(state.db.locations.list_for_user(user.id).await?))
}

pub async fn get_location(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LocationWithTags>> {
    Ok(Json(state.db.locations.fetch(id, user.id).await?))
}

pub async fn update_location(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLocationRequest>,
) -> ApiResult<Json<LocationWithTags>> {
    Ok(Json(state.db.locations.update(id, user.id, req).await?))
}

pub async fn delete_location(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    state.db.locations.delete(id, user.id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
