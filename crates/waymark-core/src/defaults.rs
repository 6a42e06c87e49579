//! Default values and environment variable names shared across crates.

/// Environment variable for the PostgreSQL connection string.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Environment variable for the API bind address.
pub const ENV_BIND_ADDR: &str = "WAYMARK_BIND_ADDR";

/// Default API bind address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

// ─── System setting keys ───────────────────────────────────────────────────
//
// Runtime-tunable configuration lives in the system_setting table, not in
// the environment, so operators can rotate keys without a restart.

/// Setting key holding the generative-AI API credential.
pub const SETTING_GENAI_API_KEY: &str = "genai_api_key";

/// Setting key holding the generative model slug.
pub const SETTING_GENAI_MODEL: &str = "genai_model";

/// Setting key holding the places-search API credential.
pub const SETTING_PLACES_API_KEY: &str = "places_api_key";

/// Setting key toggling voice-note recording ("true"/"false").
pub const SETTING_AUDIO_ENABLED: &str = "audio_recording_enabled";

/// Setting key bounding voice-note length in seconds (0 = unlimited).
pub const SETTING_MAX_AUDIO_SECONDS: &str = "max_audio_duration_seconds";

/// Default generative model slug when the setting is unset.
pub const DEFAULT_GENAI_MODEL: &str = "gemini-2.0-flash";

// ─── Cache / pagination ────────────────────────────────────────────────────

/// Time-to-live for cached system settings, in seconds.
pub const SETTINGS_CACHE_TTL_SECS: u64 = 60;

/// Fixed page size for the usage-ledger report.
pub const USAGE_PAGE_SIZE: i64 = 50;

/// Maximum number of locations returned by search.
pub const SEARCH_RESULT_LIMIT: i64 = 50;

/// Number of preview locations included per trip in the trip list.
pub const TRIP_PREVIEW_LOCATIONS: i64 = 4;

// ─── Enrichment bounds ─────────────────────────────────────────────────────

/// Total timeout for fetching a third-party page, in seconds.
pub const FETCH_TIMEOUT_SECS: u64 = 10;

/// Maximum body text kept from a fetched page, in characters.
pub const FETCH_BODY_TEXT_LIMIT: usize = 5_000;

/// Maximum images collected from a fetched page.
pub const FETCH_MAX_IMAGES: usize = 5;

/// Radius of the location bias circle for place search, in meters.
pub const PLACES_SEARCH_RADIUS_METERS: f64 = 500.0;

// ─── Prompt excerpt bounds ─────────────────────────────────────────────────

/// Page-content excerpt included in the geocoding prompt, in characters.
pub const GEOCODE_CONTENT_EXCERPT: usize = 2_000;

/// Free-text excerpt included in the location-extraction prompt.
pub const EXTRACT_TEXT_EXCERPT: usize = 5_000;

// ─── Transcription ─────────────────────────────────────────────────────────

/// Divisor used to estimate audio duration from raw byte length.
///
/// A rough approximation for compressed webm audio; the resulting value
/// is treated as approximate everywhere it is stored or reported.
pub const AUDIO_BYTES_PER_SECOND: usize = 16_000;
