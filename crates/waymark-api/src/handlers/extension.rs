//! Browser-extension endpoints: the full save pipeline plus a status
//! probe for the popup. CORS for these routes is restricted to
//! `chrome-extension://*` origins with credentials (see router setup).

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use waymark_core::{Error, TripRepository, TripSummary};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::{run_save, PipelineDeps, SaveInput, StageReport};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ExtensionSaveResponse {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub polished_description: Option<String>,
    pub tags: Vec<String>,
    /// What each pipeline stage did, for the popup's progress view.
    pub stages: Vec<StageReport>,
}

pub async fn save_location(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<ExtensionSaveResponse>> {
    let mut trip_id: Option<Uuid> = None;
    let mut name = String::new();
    let mut source_url: Option<String> = None;
    let mut audio: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string());
        match field_name.as_deref() {
            Some("tripId") => {
                let text = field.text().await.unwrap_or_default();
                trip_id = Uuid::parse_str(text.trim()).ok();
            }
            Some("name") => {
                name = field.text().await.unwrap_or_default().trim().to_string();
            }
            Some("sourceUrl") => {
                let text = field.text().await.unwrap_or_default().trim().to_string();
                if !text.is_empty() {
                    source_url = Some(text);
                }
            }
            Some("audio") => {
                let mime = field
                    .content_type()
                    .unwrap_or("audio/webm")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::InvalidInput(format!("Failed to read audio: {}", e)))?;
                audio = Some((data.to_vec(), mime));
            }
            _ => {}
        }
    }

    let Some(trip_id) = trip_id else {
        return Err(Error::InvalidInput("Trip ID and name are required".to_string()).into());
    };
    if name.is_empty() {
        return Err(Error::InvalidInput("Trip ID and name are required".to_string()).into());
    }

    let deps = PipelineDeps::from_settings(&state.db).await?;
    let outcome = run_save(
        &state.db,
        &state.fetcher,
        &deps,
        &user,
        SaveInput {
            trip_id,
            name,
            source_url,
            audio,
        },
    )
    .await?;

    let location = outcome.location;
    Ok(Json(ExtensionSaveResponse {
        id: location.location.id,
        name: location.location.name.clone(),
        address: location.location.address.clone(),
        latitude: location.location.latitude,
        longitude: location.location.longitude,
        polished_description: location.location.polished_description.clone(),
        tags: location.tags.iter().map(|t| t.name.clone()).collect(),
        stages: outcome.stages,
    }))
}

#[derive(Serialize)]
pub struct ExtensionStatus {
    pub authenticated: bool,
    pub user: StatusUser,
    pub trips: Vec<TripSummary>,
}

#[derive(Serialize)]
pub struct StatusUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

pub async fn status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ExtensionStatus>> {
    let trips = state.db.trips.list(user.id).await?;
    Ok(Json(ExtensionStatus {
        authenticated: true,
        user: StatusUser {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
        },
        trips,
    }))
}
