//! Admin settings: masked read of the key/value store, write-through
//! updates that invalidate the cache.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use waymark_core::{Error, SystemSetting};

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingView {
    pub value: String,
    pub has_value: bool,
    pub description: Option<String>,
}

/// Mask credential values to `head...tail` so the admin UI can confirm a
/// key is set without ever echoing it back.
fn mask_value(key: &str, value: &str) -> String {
    if key.contains("api_key") && value.len() > 12 {
        format!("{}...{}", &value[..8], &value[value.len() - 4..])
    } else if key.contains("api_key") && !value.is_empty() {
        "...".to_string()
    } else {
        value.to_string()
    }
}

pub async fn list_settings(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> ApiResult<Json<BTreeMap<String, SettingView>>> {
    let settings = state.db.settings.list().await?;

    let map = settings
        .into_iter()
        .map(|s| {
            let view = SettingView {
                value: mask_value(&s.key, &s.value),
                has_value: !s.value.is_empty(),
                description: s.description,
            };
            (s.key, view)
        })
        .collect();

    Ok(Json(map))
}

#[derive(Deserialize)]
pub struct PutSettingRequest {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Serialize)]
pub struct PutSettingResponse {
    pub success: bool,
    pub setting: SystemSetting,
}

pub async fn put_setting(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<PutSettingRequest>,
) -> ApiResult<Json<PutSettingResponse>> {
    if req.key.trim().is_empty() {
        return Err(Error::InvalidInput("Key is required".to_string()).into());
    }

    let setting = state
        .db
        .settings
        .put(req.key.trim(), req.value.as_deref().unwrap_or(""))
        .await?;

    Ok(Json(PutSettingResponse {
        success: true,
        setting,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_long_api_key() {
        let masked = mask_value("genai_api_key", "AIzaSyD-1234567890abcdef");
        assert_eq!(masked, "AIzaSyD-...cdef");
    }

    #[test]
    fn test_mask_short_api_key_hides_everything() {
        assert_eq!(mask_value("genai_api_key", "tiny"), "...");
    }

    #[test]
    fn test_non_key_values_pass_through() {
        assert_eq!(mask_value("genai_model", "gemini-2.0-flash"), "gemini-2.0-flash");
        assert_eq!(mask_value("audio_recording_enabled", "true"), "true");
    }

    #[test]
    fn test_empty_key_value_stays_empty() {
        assert_eq!(mask_value("places_api_key", ""), "");
    }
}
