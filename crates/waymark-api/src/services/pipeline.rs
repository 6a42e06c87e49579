//! The save-location pipeline.
//!
//! `fetch content → [transcribe] → geocode → [enrich] → extract tags →
//! persist`. Bracketed stages run only when their input exists (audio
//! present, coordinates resolved). Each stage's failure is recorded and
//! the pipeline continues with whatever data it has; a location row is
//! always persisted, in the worst case with placeholder coordinates and
//! no tags. Only the caller decides whether missing coordinates are fatal.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use waymark_core::{
    CreateLocationRequest, GenerationBackend, ListTagsRequest, LocationRepository,
    LocationWithTags, Result, TagRepository, TranscriptionBackend, TripRepository, User,
};
use waymark_db::Database;
use waymark_enrich::{format_for_prompt, ContentFetcher, PlacesClient};
use waymark_inference::{extract_tags, generate_travel_writing, geocode_from_content};

use super::backends::{self, GENAI_KEY_MISSING};
use super::usage;

/// External dependencies the pipeline calls out to.
///
/// `None` backends mean the credential is not configured; the dependent
/// stage records a configuration failure and the save continues.
pub struct PipelineDeps {
    pub generation: Option<Arc<dyn GenerationBackend>>,
    pub transcription: Option<Arc<dyn TranscriptionBackend>>,
    pub places: Option<PlacesClient>,
}

impl PipelineDeps {
    /// Resolve all backends from the settings store.
    pub async fn from_settings(db: &Database) -> Result<Self> {
        let generation = backends::generation_backend(db).await?;
        let transcription = match &generation {
            // Same credential serves both; build only when configured.
            Some(_) => Some(backends::require_transcription_backend(db).await?),
            None => None,
        };
        let places = backends::places_client(db).await?;
        Ok(Self {
            generation,
            transcription,
            places,
        })
    }
}

/// How one stage ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum StageOutcome {
    /// Ran and contributed data.
    Applied,
    /// Did not run; the reason is informational, not an error.
    Skipped(String),
    /// Ran and failed; the save continued without its data.
    Failed(String),
}

/// Per-stage record threaded through the pipeline result.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: &'static str,
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

/// Input for one save.
pub struct SaveInput {
    pub trip_id: Uuid,
    pub name: String,
    pub source_url: Option<String>,
    /// Raw audio bytes plus MIME type, when a voice note was recorded.
    pub audio: Option<(Vec<u8>, String)>,
}

/// Result of one save: the persisted location and what each stage did.
pub struct SaveOutcome {
    pub location: LocationWithTags,
    pub stages: Vec<StageReport>,
}

impl SaveOutcome {
    fn push(&mut self, stage: &'static str, outcome: StageOutcome) {
        if let StageOutcome::Failed(detail) = &outcome {
            warn!(
                subsystem = "pipeline",
                stage = stage,
                location_id = %self.location.location.id,
                error = %detail,
                "Pipeline stage degraded"
            );
        }
        self.stages.push(StageReport { stage, outcome });
    }
}

/// Run the full best-effort save pipeline for one location.
pub async fn run_save(
    db: &Database,
    fetcher: &ContentFetcher,
    deps: &PipelineDeps,
    user: &User,
    input: SaveInput,
) -> Result<SaveOutcome> {
    // Trip ownership is the one precondition; everything after this
    // degrades instead of aborting.
    let trip = db.trips.get(input.trip_id, user.id).await?;

    // Stage: fetch content.
    let (url_content, fetch_outcome) = match &input.source_url {
        Some(url) => {
            let content = fetcher.fetch(url).await;
            if content.is_empty() {
                (content, StageOutcome::Failed("page fetch returned no content".to_string()))
            } else {
                (content, StageOutcome::Applied)
            }
        }
        None => (
            Default::default(),
            StageOutcome::Skipped("no source URL".to_string()),
        ),
    };
    let url_formatted = format_for_prompt(&url_content);

    // Persist immediately with placeholder coordinates so every later
    // stage has a row to annotate and a failed enrichment still leaves a
    // saved location behind.
    let location = db
        .locations
        .insert(CreateLocationRequest {
            trip_id: trip.id,
            user_id: user.id,
            name: input.name.clone(),
            latitude: 0.0,
            longitude: 0.0,
            source_url: input.source_url.clone(),
            url_title: non_empty(&url_content.title),
            url_description: non_empty(&url_content.description),
            url_image: url_content.images.first().cloned(),
            phone: url_content.phone.clone(),
            hours: url_content.hours.clone(),
            price_range: url_content.price_range.clone(),
            rating: url_content.rating.clone(),
            cuisine: url_content.cuisine.clone(),
            reservation_url: url_content.reservation_url.clone(),
            ..Default::default()
        })
        .await?;
    let location_id = location.id;

    let mut outcome = SaveOutcome {
        location: LocationWithTags {
            location,
            tags: Vec::new(),
        },
        stages: Vec::new(),
    };
    outcome.push("fetch_content", fetch_outcome);

    // Stage: transcribe (conditional on audio), then travel writing.
    let mut raw_transcription = String::new();
    let mut polished_description = String::new();
    match (&input.audio, &deps.transcription) {
        (None, _) => {
            outcome.push("transcribe", StageOutcome::Skipped("no audio recorded".to_string()));
        }
        (Some(_), None) => {
            outcome.push("transcribe", StageOutcome::Failed(GENAI_KEY_MISSING.to_string()));
        }
        (Some((audio, mime)), Some(backend)) => match backend.transcribe(audio, mime).await {
            Ok(transcription) => {
                usage::record_transcription(db, user.id, Some(location_id), &transcription).await;
                raw_transcription = transcription.text;
                outcome.push("transcribe", StageOutcome::Applied);

                match &deps.generation {
                    Some(generation) => {
                        match generate_travel_writing(
                            generation.as_ref(),
                            &input.name,
                            url_content.address.as_deref().unwrap_or(""),
                            &raw_transcription,
                            &url_formatted,
                        )
                        .await
                        {
                            Ok((description, generation_usage)) => {
                                usage::record_generation(
                                    db,
                                    user.id,
                                    Some(location_id),
                                    "generate_description",
                                    &generation_usage,
                                )
                                .await;
                                polished_description = description;
                                outcome.push("travel_writing", StageOutcome::Applied);
                            }
                            Err(e) => {
                                outcome.push("travel_writing", StageOutcome::Failed(e.to_string()));
                            }
                        }
                    }
                    None => {
                        outcome
                            .push("travel_writing", StageOutcome::Failed(GENAI_KEY_MISSING.to_string()));
                    }
                }
            }
            Err(e) => {
                outcome.push("transcribe", StageOutcome::Failed(e.to_string()));
            }
        },
    }

    // Stage: geocode.
    let mut latitude = 0.0;
    let mut longitude = 0.0;
    let mut address: Option<String> = None;
    match &deps.generation {
        Some(generation) => {
            match geocode_from_content(
                generation.as_ref(),
                input.source_url.as_deref().unwrap_or(""),
                &input.name,
                &url_formatted,
                &raw_transcription,
            )
            .await
            {
                Ok((result, generation_usage)) => {
                    usage::record_generation(
                        db,
                        user.id,
                        Some(location_id),
                        "geocode",
                        &generation_usage,
                    )
                    .await;
                    if let Some(coordinates) = result.coordinates {
                        latitude = coordinates.lat;
                        longitude = coordinates.lng;
                    }
                    address = result.address;
                    outcome.push("geocode", StageOutcome::Applied);
                }
                Err(e) => {
                    outcome.push("geocode", StageOutcome::Failed(e.to_string()));
                }
            }
        }
        None => {
            outcome.push("geocode", StageOutcome::Failed(GENAI_KEY_MISSING.to_string()));
        }
    }

    db.locations
        .set_resolved(
            location_id,
            latitude,
            longitude,
            address.as_deref(),
            non_empty(&raw_transcription).as_deref(),
            non_empty(&polished_description).as_deref(),
        )
        .await?;

    // Stage: places enrichment (conditional on resolved coordinates).
    if latitude != 0.0 && longitude != 0.0 {
        match &deps.places {
            Some(places) => match places.search(&input.name, latitude, longitude).await? {
                Some(enrichment) => {
                    usage::record_places_search(db, user.id, Some(location_id)).await;
                    db.locations
                        .apply_enrichment(location_id, &enrichment, Utc::now())
                        .await?;
                    outcome.push("enrich", StageOutcome::Applied);
                }
                None => {
                    outcome.push("enrich", StageOutcome::Skipped("no matching place".to_string()));
                }
            },
            None => {
                outcome.push(
                    "enrich",
                    StageOutcome::Skipped("places credential not configured".to_string()),
                );
            }
        }
    } else {
        outcome.push("enrich", StageOutcome::Skipped("coordinates unresolved".to_string()));
    }

    // Stage: tag extraction.
    match &deps.generation {
        Some(generation) => {
            let vocabulary = db
                .tags
                .list(ListTagsRequest::default())
                .await
                .unwrap_or_default();
            match extract_tags(
                generation.as_ref(),
                &input.name,
                &polished_description,
                &raw_transcription,
                &vocabulary,
            )
            .await
            {
                Ok((suggestions, generation_usage)) => {
                    usage::record_generation(
                        db,
                        user.id,
                        Some(location_id),
                        "extract_tags",
                        &generation_usage,
                    )
                    .await;
                    match db.tags.resolve_suggestions(&suggestions).await {
                        Ok(tag_ids) => {
                            if let Err(e) = db.tags.attach_to_location(location_id, &tag_ids).await {
                                outcome.push("extract_tags", StageOutcome::Failed(e.to_string()));
                            } else {
                                outcome.push("extract_tags", StageOutcome::Applied);
                            }
                        }
                        Err(e) => {
                            outcome.push("extract_tags", StageOutcome::Failed(e.to_string()));
                        }
                    }
                }
                Err(e) => {
                    outcome.push("extract_tags", StageOutcome::Failed(e.to_string()));
                }
            }
        }
        None => {
            outcome.push("extract_tags", StageOutcome::Failed(GENAI_KEY_MISSING.to_string()));
        }
    }

    // Re-read the finished row with tags.
    outcome.location = db.locations.fetch(location_id, user.id).await?;

    info!(
        subsystem = "pipeline",
        op = "save_location",
        location_id = %location_id,
        trip_id = %trip.id,
        user_id = %user.id,
        degraded_stages = outcome
            .stages
            .iter()
            .filter(|s| matches!(s.outcome, StageOutcome::Failed(_)))
            .count(),
        "Save pipeline finished"
    );

    Ok(outcome)
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_outcome_serialization() {
        let applied = serde_json::to_value(StageOutcome::Applied).unwrap();
        assert_eq!(applied["outcome"], "applied");

        let failed = serde_json::to_value(StageOutcome::Failed("boom".to_string())).unwrap();
        assert_eq!(failed["outcome"], "failed");
        assert_eq!(failed["detail"], "boom");
    }

    #[test]
    fn test_stage_report_flattens_outcome() {
        let report = StageReport {
            stage: "geocode",
            outcome: StageOutcome::Skipped("why".to_string()),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stage"], "geocode");
        assert_eq!(json["outcome"], "skipped");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("x"), Some("x".to_string()));
    }
}
