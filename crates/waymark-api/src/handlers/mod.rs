//! HTTP handlers, grouped by resource.

pub mod audio;
pub mod costs;
pub mod extension;
pub mod import;
pub mod locations;
pub mod search;
pub mod settings;
pub mod share;
pub mod tags_admin;
pub mod trips;

use axum::Json;

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
