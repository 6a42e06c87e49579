//! Structured logging schema and field name constants for waymark.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (selector hits, rows) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → pipeline → sub-calls.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "inference", "enrich", "pipeline"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "fetcher", "places", "gemini", "pool", "settings_cache"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "geocode", "transcribe", "extract_tags", "save_location"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Trip UUID being operated on.
pub const TRIP_ID: &str = "trip_id";

/// Location UUID being operated on.
pub const LOCATION_ID: &str = "location_id";

/// User UUID the request acts on behalf of.
pub const USER_ID: &str = "user_id";

/// Import job UUID being processed.
pub const IMPORT_JOB_ID: &str = "import_job_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or query.
pub const RESULT_COUNT: &str = "result_count";

/// Prompt token count reported by the model.
pub const INPUT_TOKENS: &str = "input_tokens";

/// Completion token count reported by the model.
pub const OUTPUT_TOKENS: &str = "output_tokens";

/// Byte length of a prompt or response.
pub const PROMPT_LEN: &str = "prompt_len";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

/// External service a usage-ledger row is attributed to.
pub const SERVICE: &str = "service";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Pipeline stage name when a stage degrades.
pub const STAGE: &str = "stage";
