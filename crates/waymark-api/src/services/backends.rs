//! Backend construction from runtime settings.
//!
//! Credentials live in the settings store (cached, invalidated on write)
//! so operators can rotate keys without a restart; backends are built per
//! request from the cached values.

use std::sync::Arc;

use waymark_core::{
    defaults, Error, GenerationBackend, Result, TranscriptionBackend,
};
use waymark_db::Database;
use waymark_enrich::PlacesClient;
use waymark_inference::GeminiBackend;

/// Message surfaced whenever the generative credential is absent.
pub const GENAI_KEY_MISSING: &str =
    "Generative API key not configured. Please add it in the admin settings.";

async fn gemini_from_settings(db: &Database) -> Result<Option<GeminiBackend>> {
    let Some(api_key) = db.settings.get_non_empty(defaults::SETTING_GENAI_API_KEY).await? else {
        return Ok(None);
    };
    let model = db
        .settings
        .get_non_empty(defaults::SETTING_GENAI_MODEL)
        .await?
        .unwrap_or_else(|| defaults::DEFAULT_GENAI_MODEL.to_string());
    Ok(Some(GeminiBackend::new(api_key, model)))
}

/// Generation backend, or `None` when no credential is configured.
pub async fn generation_backend(db: &Database) -> Result<Option<Arc<dyn GenerationBackend>>> {
    Ok(gemini_from_settings(db)
        .await?
        .map(|b| Arc::new(b) as Arc<dyn GenerationBackend>))
}

/// Generation backend, erroring when no credential is configured.
///
/// Used by endpoints where generation is the whole operation (parse-text,
/// audio transcription) and a missing credential must surface.
pub async fn require_generation_backend(db: &Database) -> Result<Arc<dyn GenerationBackend>> {
    generation_backend(db)
        .await?
        .ok_or_else(|| Error::Config(GENAI_KEY_MISSING.to_string()))
}

/// Transcription backend, erroring when no credential is configured.
pub async fn require_transcription_backend(db: &Database) -> Result<Arc<dyn TranscriptionBackend>> {
    gemini_from_settings(db)
        .await?
        .map(|b| Arc::new(b) as Arc<dyn TranscriptionBackend>)
        .ok_or_else(|| Error::Config(GENAI_KEY_MISSING.to_string()))
}

/// Places client, or `None` when no credential is configured.
pub async fn places_client(db: &Database) -> Result<Option<PlacesClient>> {
    Ok(db
        .settings
        .get_non_empty(defaults::SETTING_PLACES_API_KEY)
        .await?
        .map(PlacesClient::new))
}
