//! Core data models for waymark.
//!
//! These types are shared across all waymark crates and represent the
//! core domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tags::TagCategory;

// =============================================================================
// USER TYPES
// =============================================================================

/// Account that owns trips, locations, and usage-ledger rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// TRIP TYPES
// =============================================================================

/// A named collection of saved locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Opaque token granting public read-only access.
    pub share_token: String,
    pub home_base_address: Option<String>,
    pub home_base_url: Option<String>,
    pub home_base_latitude: Option<f64>,
    pub home_base_longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trip list entry with location count and a handful of previews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSummary {
    #[serde(flatten)]
    pub trip: Trip,
    pub location_count: i64,
    pub preview_locations: Vec<LocationPreview>,
}

/// Minimal location view used in trip previews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPreview {
    pub id: Uuid,
    pub name: String,
    pub url_image: Option<String>,
}

/// Request to create a trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTripRequest {
    pub title: String,
    pub description: Option<String>,
    pub home_base_address: Option<String>,
    pub home_base_url: Option<String>,
    pub home_base_latitude: Option<f64>,
    pub home_base_longitude: Option<f64>,
}

/// Partial trip update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTripRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub home_base_address: Option<String>,
    pub home_base_url: Option<String>,
    pub home_base_latitude: Option<f64>,
    pub home_base_longitude: Option<f64>,
}

// =============================================================================
// LOCATION TYPES
// =============================================================================

/// A saved place with scraped, transcribed, and enriched fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub source_url: Option<String>,

    // Scraped page metadata (Content Fetcher output)
    pub url_title: Option<String>,
    pub url_description: Option<String>,
    pub url_image: Option<String>,
    pub phone: Option<String>,
    pub hours: Option<String>,
    pub price_range: Option<String>,
    pub rating: Option<String>,
    pub cuisine: Option<String>,
    pub reservation_url: Option<String>,

    // Voice note + generated writing
    pub raw_transcription: Option<String>,
    pub polished_description: Option<String>,

    // Places enrichment
    pub place_id: Option<String>,
    pub place_rating: Option<f64>,
    pub place_review_count: Option<i32>,
    pub place_types: Vec<String>,
    pub place_website: Option<String>,
    pub place_phone: Option<String>,
    pub place_address: Option<String>,
    pub places_enriched_at: Option<DateTime<Utc>>,

    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Location plus its resolved tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationWithTags {
    #[serde(flatten)]
    pub location: Location,
    pub tags: Vec<Tag>,
}

/// Request to insert a new location row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateLocationRequest {
    pub trip_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub source_url: Option<String>,
    pub url_title: Option<String>,
    pub url_description: Option<String>,
    pub url_image: Option<String>,
    pub phone: Option<String>,
    pub hours: Option<String>,
    pub price_range: Option<String>,
    pub rating: Option<String>,
    pub cuisine: Option<String>,
    pub reservation_url: Option<String>,
    pub raw_transcription: Option<String>,
}

/// Partial location update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub source_url: Option<String>,
    pub raw_transcription: Option<String>,
    pub polished_description: Option<String>,
    pub order_index: Option<i32>,
    /// Full replacement of the location's tag set when present.
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Search filters for the location search endpoint.
#[derive(Debug, Clone, Default)]
pub struct LocationSearchRequest {
    pub user_id: Uuid,
    pub query: Option<String>,
    pub tag_names: Vec<String>,
    pub trip_id: Option<Uuid>,
}

// =============================================================================
// TAG TYPES
// =============================================================================

/// A deduplicated label attached to locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    /// Canonical lowercase-hyphenated name, unique case-insensitively.
    pub name: String,
    pub category: TagCategory,
    pub usage_count: i32,
    pub created_by_llm: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Tag listing filters for the admin endpoint.
#[derive(Debug, Clone, Default)]
pub struct ListTagsRequest {
    pub category: Option<TagCategory>,
    pub search: Option<String>,
    pub include_inactive: bool,
}

/// Partial tag update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTagRequest {
    pub name: Option<String>,
    pub category: Option<TagCategory>,
    pub is_active: Option<bool>,
}

/// Outcome of a tag delete: soft when still referenced, hard otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagDeleteOutcome {
    SoftDeleted,
    HardDeleted,
}

/// Result of merging one tag into another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagMergeResult {
    pub merged_count: i64,
    pub target: Tag,
}

// =============================================================================
// INFERENCE TYPES
// =============================================================================

/// One completed text generation, with token accounting for the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub model: String,
}

/// One completed audio transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    /// Estimated from byte length; approximate for compressed audio.
    pub duration_seconds: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub model: String,
}

/// Model confidence reported by the geocoding adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Structured result of geocoding text context through the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub name: String,
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub confidence: Confidence,
    pub reasoning: String,
}

/// One tag suggested by the extraction adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSuggestion {
    pub name: String,
    pub category: TagCategory,
    pub existing: bool,
}

/// One location candidate extracted from pasted free text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub name: String,
    pub address: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// ENRICHMENT TYPES
// =============================================================================

/// Best-effort structured content extracted from a fetched page.
///
/// All fields default to empty; a failed fetch yields the default value
/// rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlContent {
    pub title: String,
    pub description: String,
    /// Whitespace-collapsed body text, bounded in length.
    pub content: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub hours: Option<String>,
    pub rating: Option<String>,
    pub price_range: Option<String>,
    pub cuisine: Option<String>,
    pub images: Vec<String>,
    pub reviews: Vec<String>,
    pub reservation_url: Option<String>,
}

impl UrlContent {
    /// True when nothing was extracted (failed or empty fetch).
    pub fn is_empty(&self) -> bool {
        self == &UrlContent::default()
    }
}

/// Normalized enrichment fields from the places API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceEnrichment {
    pub place_id: String,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub types: Vec<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub formatted_address: Option<String>,
    /// Weekday descriptions joined with "; ".
    pub hours: Option<String>,
    /// Price level rendered as Free / $ / $$ / $$$ / $$$$.
    pub price_range: Option<String>,
}

// =============================================================================
// USAGE LEDGER TYPES
// =============================================================================

/// One external-API call to record in the ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageEntry {
    pub user_id: Uuid,
    pub location_id: Option<Uuid>,
    pub service: String,
    pub operation: String,
    pub model: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub audio_duration_seconds: Option<i64>,
}

/// A persisted usage-ledger row. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiUsageLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_id: Option<Uuid>,
    pub service: String,
    pub operation: String,
    pub model: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub audio_duration_seconds: Option<i64>,
    pub cost_usd: f64,
    pub created_at: DateTime<Utc>,
}

/// Reporting window for usage summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsagePeriod {
    Day,
    Week,
    Month,
    Year,
}

impl Default for UsagePeriod {
    fn default() -> Self {
        UsagePeriod::Month
    }
}

/// Cost rollup for one service within a window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCost {
    pub service: String,
    pub cost: f64,
    pub count: i64,
}

/// Cost rollup for one user within a window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCost {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub cost: f64,
    pub count: i64,
}

/// Aggregate usage report for the admin cost view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSummary {
    pub total: f64,
    pub by_service: Vec<ServiceCost>,
    pub by_user: Vec<UserCost>,
}

// =============================================================================
// SETTINGS TYPES
// =============================================================================

/// Process-wide key/value configuration row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// IMPORT JOB TYPES
// =============================================================================

/// Lifecycle state of a bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Processing,
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Processing => "processing",
            ImportStatus::Completed => "completed",
            ImportStatus::Failed => "failed",
        }
    }
}

/// Tracks a bulk-import operation's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub trip_id: Uuid,
    pub source_type: String,
    pub status: ImportStatus,
    pub total_locations: i32,
    pub processed_locations: i32,
    pub imported_locations: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Confidence::High).unwrap(), "\"high\"");
        let parsed: Confidence = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, Confidence::Low);
    }

    #[test]
    fn test_url_content_default_is_empty() {
        assert!(UrlContent::default().is_empty());
        let content = UrlContent {
            title: "Example Bistro".to_string(),
            ..Default::default()
        };
        assert!(!content.is_empty());
    }

    #[test]
    fn test_import_status_as_str() {
        assert_eq!(ImportStatus::Processing.as_str(), "processing");
        assert_eq!(ImportStatus::Completed.as_str(), "completed");
        assert_eq!(ImportStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn test_geocode_result_round_trip() {
        let result = GeocodeResult {
            name: "Example Bistro".to_string(),
            address: Some("123 Main St".to_string()),
            coordinates: Some(Coordinates { lat: 10.0, lng: 20.0 }),
            confidence: Confidence::High,
            reasoning: "well-known place".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["coordinates"]["lat"], 10.0);
        assert_eq!(json["confidence"], "high");
        let back: GeocodeResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.coordinates, result.coordinates);
    }

    #[test]
    fn test_user_api_key_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "traveler@example.com".to_string(),
            display_name: None,
            api_key: "secret".to_string(),
            is_admin: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("api_key").is_none());
    }
}
