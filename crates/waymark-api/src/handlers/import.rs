//! Bulk import and smart-import preview.
//!
//! Imports process one location at a time, geocoding rows that arrive
//! without coordinates and skipping (with a recorded error) rows that
//! still have none. The job row tracks progress across the loop.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use waymark_core::{
    CreateLocationRequest, Error, ImportStatus, ImportJobRepository, ListTagsRequest,
    LocationCandidate, LocationRepository, Tag, TagRepository, TripRepository,
};
use waymark_inference::{extract_locations_from_text, geocode_from_content};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::{backends, usage};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub trip_id: Uuid,
    pub source_type: String,
    /// Pre-parsed rows (direct or CSV import).
    #[serde(default)]
    pub locations: Option<Vec<ImportRow>>,
    /// Freeform text for LLM extraction.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub csv_data: Option<Vec<ImportRow>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub success: bool,
    pub import_job_id: Uuid,
    pub total_locations: usize,
    pub imported_locations: i32,
    pub errors: Vec<String>,
}

pub async fn import_locations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<ImportRequest>,
) -> ApiResult<Json<ImportResponse>> {
    let trip = state.db.trips.get(req.trip_id, user.id).await?;
    let job = state
        .db
        .import_jobs
        .create(user.id, trip.id, &req.source_type)
        .await?;

    let generation = backends::generation_backend(&state.db).await?;

    // Resolve the rows to import from whichever source was supplied.
    let rows: Vec<ImportRow> = match req.source_type.as_str() {
        "direct" => req.locations.unwrap_or_default(),
        "csv" => req.csv_data.unwrap_or_default(),
        "text" | "google_docs" => {
            let Some(text) = req.text.filter(|t| !t.trim().is_empty()) else {
                state
                    .db
                    .import_jobs
                    .finalize(job.id, ImportStatus::Failed, 0, Some("Invalid import data"))
                    .await?;
                return Err(Error::InvalidInput("Invalid import data".to_string()).into());
            };
            let Some(backend) = &generation else {
                state
                    .db
                    .import_jobs
                    .finalize(job.id, ImportStatus::Failed, 0, Some(backends::GENAI_KEY_MISSING))
                    .await?;
                return Err(Error::Config(backends::GENAI_KEY_MISSING.to_string()).into());
            };
            let (candidates, generation_usage) =
                extract_locations_from_text(backend.as_ref(), &text).await?;
            usage::record_generation(&state.db, user.id, None, "extract_locations", &generation_usage)
                .await;
            candidates
                .into_iter()
                .map(|c: LocationCandidate| ImportRow {
                    name: c.name,
                    address: c.address,
                    url: c.url,
                    notes: c.notes,
                    latitude: None,
                    longitude: None,
                })
                .collect()
        }
        _ => {
            state
                .db
                .import_jobs
                .finalize(job.id, ImportStatus::Failed, 0, Some("Invalid import data"))
                .await?;
            return Err(Error::InvalidInput("Invalid import data".to_string()).into());
        }
    };

    if rows.is_empty() {
        state
            .db
            .import_jobs
            .finalize(job.id, ImportStatus::Failed, 0, Some("Invalid import data"))
            .await?;
        return Err(Error::InvalidInput("Invalid import data".to_string()).into());
    }

    state.db.import_jobs.set_total(job.id, rows.len() as i32).await?;

    let mut imported = 0;
    let mut errors: Vec<String> = Vec::new();

    for row in &rows {
        let mut latitude = row.latitude;
        let mut longitude = row.longitude;

        // Geocode rows that arrived without coordinates.
        if latitude.is_none() || longitude.is_none() {
            if let Some(backend) = &generation {
                match geocode_from_content(
                    backend.as_ref(),
                    row.url.as_deref().unwrap_or(""),
                    &row.name,
                    row.notes.as_deref().unwrap_or(""),
                    row.address.as_deref().unwrap_or(""),
                )
                .await
                {
                    Ok((result, generation_usage)) => {
                        usage::record_generation(&state.db, user.id, None, "geocode", &generation_usage)
                            .await;
                        if let Some(coordinates) = result.coordinates {
                            latitude = Some(coordinates.lat);
                            longitude = Some(coordinates.lng);
                        }
                    }
                    Err(e) => {
                        warn!(
                            subsystem = "api",
                            op = "import",
                            name = %row.name,
                            error = %e,
                            "Geocoding failed during import"
                        );
                    }
                }
            }
        }

        match (latitude, longitude) {
            (Some(lat), Some(lng)) => {
                let insert = state
                    .db
                    .locations
                    .insert(CreateLocationRequest {
                        trip_id: trip.id,
                        user_id: user.id,
                        name: row.name.clone(),
                        latitude: lat,
                        longitude: lng,
                        address: row.address.clone(),
                        source_url: row.url.clone(),
                        raw_transcription: row.notes.clone(),
                        ..Default::default()
                    })
                    .await;
                match insert {
                    Ok(_) => imported += 1,
                    Err(e) => {
                        warn!(subsystem = "api", op = "import", name = %row.name, error = %e, "Insert failed during import");
                        errors.push(format!("Failed to import: {}", row.name));
                    }
                }
            }
            _ => errors.push(format!("Could not geocode: {}", row.name)),
        }

        state.db.import_jobs.increment_processed(job.id).await?;
    }

    let error_message = if errors.is_empty() {
        None
    } else {
        Some(errors.join("; "))
    };
    state
        .db
        .import_jobs
        .finalize(job.id, ImportStatus::Completed, imported, error_message.as_deref())
        .await?;

    info!(
        subsystem = "api",
        op = "import",
        import_job_id = %job.id,
        total = rows.len(),
        imported,
        errors = errors.len(),
        "Bulk import finished"
    );

    Ok(Json(ImportResponse {
        success: true,
        import_job_id: job.id,
        total_locations: rows.len(),
        imported_locations: imported,
        errors,
    }))
}

#[derive(Deserialize)]
pub struct ParseTextRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct ParseTextResponse {
    pub locations: Vec<LocationCandidate>,
    /// Active vocabulary, fetched alongside extraction for the preview UI.
    pub tags: Vec<Tag>,
}

pub async fn parse_text(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<ParseTextRequest>,
) -> ApiResult<Json<ParseTextResponse>> {
    if req.text.trim().is_empty() {
        return Err(Error::InvalidInput("Text is required".to_string()).into());
    }

    let backend = backends::require_generation_backend(&state.db).await?;

    // Extraction and the vocabulary fetch are independent; run them
    // concurrently and wait for both.
    let (extracted, vocabulary) = tokio::join!(
        extract_locations_from_text(backend.as_ref(), &req.text),
        state.db.tags.list(ListTagsRequest::default()),
    );

    let (locations, generation_usage) = extracted?;
    usage::record_generation(&state.db, user.id, None, "extract_locations", &generation_usage)
        .await;

    Ok(Json(ParseTextResponse {
        locations,
        tags: vocabulary?,
    }))
}
