//! Location search with tag and trip filters.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use waymark_core::{
    ListTagsRequest, LocationRepository, LocationSearchRequest, LocationWithTags, Tag,
    TagRepository, TripRepository, TripSummary,
};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    /// Comma-separated tag names.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub trip_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub locations: Vec<LocationWithTags>,
    /// Active vocabulary for the filter UI.
    pub tags: Vec<Tag>,
    pub trips: Vec<TripSummary>,
}

pub async fn search(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let tag_names: Vec<String> = params
        .tags
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let locations = state
        .db
        .locations
        .search(LocationSearchRequest {
            user_id: user.id,
            query: params.q,
            tag_names,
            trip_id: params.trip_id,
        })
        .await?;

    let tags = state.db.tags.list(ListTagsRequest::default()).await?;
    let trips = state.db.trips.list(user.id).await?;

    Ok(Json(SearchResponse {
        locations,
        tags,
        trips,
    }))
}
