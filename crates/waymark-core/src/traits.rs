//! Repository and backend trait definitions.
//!
//! Implementations live in `waymark-db` (PostgreSQL) and
//! `waymark-inference` (generative backends); handlers and the save
//! pipeline program against these traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    ApiUsageLog, CreateLocationRequest, CreateTripRequest, Generation, ImportJob, ImportStatus,
    ListTagsRequest, Location, LocationSearchRequest, LocationWithTags, PlaceEnrichment,
    SystemSetting, Tag, TagDeleteOutcome, TagMergeResult, TagSuggestion, Transcription, Trip,
    TripSummary, UpdateLocationRequest, UpdateTagRequest, UpdateTripRequest, UsageEntry,
    UsagePeriod, UsageSummary, User,
};

/// User lookup for the API-key auth layer.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by API key. Returns None for unknown keys.
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>>;

    /// Fetch a user by id.
    async fn get(&self, id: Uuid) -> Result<User>;
}

/// Trip CRUD, scoped to an owning user.
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, req: CreateTripRequest) -> Result<Trip>;

    /// List the user's trips, most recently updated first, with location
    /// counts and preview locations.
    async fn list(&self, user_id: Uuid) -> Result<Vec<TripSummary>>;

    /// Fetch a trip the user owns. `Error::TripNotFound` otherwise.
    async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Trip>;

    /// Fetch a trip by its public share token, regardless of owner.
    async fn get_by_share_token(&self, token: &str) -> Result<Trip>;

    async fn update(&self, id: Uuid, user_id: Uuid, req: UpdateTripRequest) -> Result<Trip>;

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<()>;
}

/// Location CRUD plus the enrichment write paths used by the pipeline.
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Insert a new location at the end of the trip's ordering.
    async fn insert(&self, req: CreateLocationRequest) -> Result<Location>;

    /// Fetch a location the user owns, with its tags.
    async fn fetch(&self, id: Uuid, user_id: Uuid) -> Result<LocationWithTags>;

    /// All locations for one trip, in order.
    async fn list_for_trip(&self, trip_id: Uuid) -> Result<Vec<LocationWithTags>>;

    /// All locations for one user, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<LocationWithTags>>;

    /// Filtered search, capped at `defaults::SEARCH_RESULT_LIMIT` rows.
    async fn search(&self, req: LocationSearchRequest) -> Result<Vec<LocationWithTags>>;

    async fn update(&self, id: Uuid, user_id: Uuid, req: UpdateLocationRequest)
        -> Result<LocationWithTags>;

    /// Overwrite coordinates/address and transcription-derived fields
    /// after the pipeline resolves them.
    async fn set_resolved(
        &self,
        id: Uuid,
        latitude: f64,
        longitude: f64,
        address: Option<&str>,
        raw_transcription: Option<&str>,
        polished_description: Option<&str>,
    ) -> Result<()>;

    /// Apply places enrichment. Enrichment fields override scraped ones;
    /// scraped values stay in place where enrichment has nothing.
    async fn apply_enrichment(
        &self,
        id: Uuid,
        enrichment: &PlaceEnrichment,
        enriched_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Store a new transcription and generated description.
    async fn set_transcription(
        &self,
        id: Uuid,
        raw_transcription: &str,
        polished_description: Option<&str>,
    ) -> Result<()>;

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<()>;
}

/// Tag management: normalization-aware CRUD, merge, and usage counting.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a tag from a raw name. The name is normalized; a
    /// case-insensitive duplicate is `Error::InvalidInput`.
    async fn create(&self, name: &str, category: crate::tags::TagCategory, created_by_llm: bool)
        -> Result<Tag>;

    async fn list(&self, req: ListTagsRequest) -> Result<Vec<Tag>>;

    async fn get(&self, id: Uuid) -> Result<Tag>;

    async fn update(&self, id: Uuid, req: UpdateTagRequest) -> Result<Tag>;

    /// Resolve each suggestion to an existing tag (case-insensitive) or
    /// create it as LLM-suggested; returns the resolved tag ids.
    async fn resolve_suggestions(&self, suggestions: &[TagSuggestion]) -> Result<Vec<Uuid>>;

    /// Attach tags to a location, incrementing usage counts. Existing
    /// associations are left alone.
    async fn attach_to_location(&self, location_id: Uuid, tag_ids: &[Uuid]) -> Result<()>;

    /// Replace a location's tag set, recomputing usage counts.
    async fn set_for_location(&self, location_id: Uuid, tag_ids: &[Uuid]) -> Result<()>;

    /// Soft-delete (mark inactive) when still referenced, hard-delete
    /// otherwise.
    async fn delete(&self, id: Uuid) -> Result<TagDeleteOutcome>;

    /// Move every association from `source` onto `target`, dropping
    /// duplicates, recompute the target's usage count, and remove the
    /// source tag. One transaction.
    async fn merge(&self, source_id: Uuid, target_id: Uuid) -> Result<TagMergeResult>;

    /// Recompute every tag's usage_count from live associations.
    async fn recompute_usage_counts(&self) -> Result<()>;
}

/// Append-only ledger of external-API calls.
#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Record one call. Cost is computed from the pricing table at write
    /// time; rows are never updated afterwards.
    async fn record(&self, entry: UsageEntry) -> Result<()>;

    /// Aggregate cost rollups for the window.
    async fn summary(
        &self,
        period: UsagePeriod,
        service: Option<&str>,
        user_id: Option<Uuid>,
    ) -> Result<UsageSummary>;

    /// Paginated raw rows for the window, newest first, fixed page size.
    async fn list(
        &self,
        period: UsagePeriod,
        service: Option<&str>,
        user_id: Option<Uuid>,
        page: i64,
    ) -> Result<(Vec<ApiUsageLog>, i64)>;
}

/// Key/value configuration store.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<SystemSetting>>;

    async fn list(&self) -> Result<Vec<SystemSetting>>;

    /// Insert or overwrite a setting value.
    async fn put(&self, key: &str, value: &str) -> Result<SystemSetting>;
}

/// Bulk-import progress tracking.
#[async_trait]
pub trait ImportJobRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, trip_id: Uuid, source_type: &str) -> Result<ImportJob>;

    async fn set_total(&self, id: Uuid, total: i32) -> Result<()>;

    async fn increment_processed(&self, id: Uuid) -> Result<()>;

    /// Final state transition with imported count and joined errors.
    async fn finalize(
        &self,
        id: Uuid,
        status: ImportStatus,
        imported: i32,
        error_message: Option<&str>,
    ) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<ImportJob>;
}

/// Backend for plain text generation with token accounting.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a completion for the prompt.
    async fn generate(&self, prompt: &str) -> Result<Generation>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for transcribing recorded audio.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Transcribe audio data.
    async fn transcribe(&self, audio_data: &[u8], mime_type: &str) -> Result<Transcription>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
