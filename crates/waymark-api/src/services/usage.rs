//! Usage-ledger recording helpers.
//!
//! Every external call reports here; a failed ledger write is logged and
//! swallowed so bookkeeping can never block a save.

use tracing::warn;
use uuid::Uuid;

use waymark_core::pricing::service;
use waymark_core::{Generation, Transcription, UsageEntry, UsageRepository};
use waymark_db::Database;

async fn record(db: &Database, entry: UsageEntry) {
    let operation = entry.operation.clone();
    if let Err(e) = db.usage.record(entry).await {
        warn!(
            subsystem = "api",
            component = "usage",
            op = %operation,
            error = %e,
            "Failed to record usage ledger row"
        );
    }
}

/// Record one generation call.
pub async fn record_generation(
    db: &Database,
    user_id: Uuid,
    location_id: Option<Uuid>,
    operation: &str,
    generation: &Generation,
) {
    record(
        db,
        UsageEntry {
            user_id,
            location_id,
            service: service::GENAI.to_string(),
            operation: operation.to_string(),
            model: Some(generation.model.clone()),
            input_tokens: Some(generation.input_tokens),
            output_tokens: Some(generation.output_tokens),
            audio_duration_seconds: None,
        },
    )
    .await;
}

/// Record one transcription call, including the estimated duration.
pub async fn record_transcription(
    db: &Database,
    user_id: Uuid,
    location_id: Option<Uuid>,
    transcription: &Transcription,
) {
    record(
        db,
        UsageEntry {
            user_id,
            location_id,
            service: service::GENAI.to_string(),
            operation: "transcribe".to_string(),
            model: Some(transcription.model.clone()),
            input_tokens: Some(transcription.input_tokens),
            output_tokens: Some(transcription.output_tokens),
            audio_duration_seconds: Some(transcription.duration_seconds),
        },
    )
    .await;
}

/// Record one place text-search call (no token accounting).
pub async fn record_places_search(db: &Database, user_id: Uuid, location_id: Option<Uuid>) {
    record(
        db,
        UsageEntry {
            user_id,
            location_id,
            service: service::PLACES.to_string(),
            operation: "text_search".to_string(),
            model: None,
            input_tokens: None,
            output_tokens: None,
            audio_duration_seconds: None,
        },
    )
    .await;
}
