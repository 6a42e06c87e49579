//! Voice-note processing: transcribe, rewrite, re-tag one location.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use waymark_core::{
    defaults, Error, ListTagsRequest, LocationRepository, LocationWithTags, TagRepository,
    TagSuggestion,
};
use waymark_inference::{extract_tags, generate_travel_writing};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::{backends, usage};
use crate::state::AppState;

#[derive(Serialize)]
pub struct AudioProcessResponse {
    pub success: bool,
    pub transcription: String,
    pub description: String,
    pub tags: Vec<TagSuggestion>,
    pub location: LocationWithTags,
}

pub async fn process_audio(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<AudioProcessResponse>> {
    // Feature toggle and duration bound both live in runtime settings.
    if state
        .db
        .settings
        .get(defaults::SETTING_AUDIO_ENABLED)
        .await?
        .as_deref()
        == Some("false")
    {
        return Err(Error::Forbidden("Audio recording is disabled".to_string()).into());
    }

    let location = state.db.locations.fetch(id, user.id).await?;

    let mut audio: Option<(Vec<u8>, String)> = None;
    let mut client_duration: f64 = 0.0;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
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
            Some("duration") => {
                let text = field.text().await.unwrap_or_default();
                client_duration = text.parse().unwrap_or(0.0);
            }
            _ => {}
        }
    }

    let Some((audio_data, mime_type)) = audio else {
        return Err(Error::InvalidInput("No audio file provided".to_string()).into());
    };

    let max_duration: f64 = state
        .db
        .settings
        .get(defaults::SETTING_MAX_AUDIO_SECONDS)
        .await?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0.0);
    if max_duration > 0.0 && client_duration > max_duration {
        return Err(Error::InvalidInput(format!(
            "Audio duration exceeds maximum of {} seconds",
            max_duration
        ))
        .into());
    }

    // Transcription is the whole point of this endpoint; a missing
    // credential surfaces rather than degrading.
    let transcription_backend = backends::require_transcription_backend(&state.db).await?;
    let transcription = transcription_backend
        .transcribe(&audio_data, &mime_type)
        .await?;
    usage::record_transcription(&state.db, user.id, Some(id), &transcription).await;

    state
        .db
        .locations
        .set_transcription(id, &transcription.text, None)
        .await?;

    let generation_backend = backends::require_generation_backend(&state.db).await?;
    let (description, writing_usage) = generate_travel_writing(
        generation_backend.as_ref(),
        &location.location.name,
        location.location.address.as_deref().unwrap_or(""),
        &transcription.text,
        location.location.url_description.as_deref().unwrap_or(""),
    )
    .await?;
    usage::record_generation(&state.db, user.id, Some(id), "generate_description", &writing_usage)
        .await;

    state
        .db
        .locations
        .set_transcription(id, &transcription.text, Some(&description))
        .await?;

    // Re-tag from the fresh transcription, replacing the existing set.
    let vocabulary = state.db.tags.list(ListTagsRequest::default()).await?;
    let (suggestions, tags_usage) = extract_tags(
        generation_backend.as_ref(),
        &location.location.name,
        &description,
        &transcription.text,
        &vocabulary,
    )
    .await?;
    usage::record_generation(&state.db, user.id, Some(id), "extract_tags", &tags_usage).await;

    let tag_ids = state.db.tags.resolve_suggestions(&suggestions).await?;
    state.db.tags.set_for_location(id, &tag_ids).await?;

    let updated = state.db.locations.fetch(id, user.id).await?;

    Ok(Json(AudioProcessResponse {
        success: true,
        transcription: transcription.text,
        description,
        tags: suggestions,
        location: updated,
    }))
}
