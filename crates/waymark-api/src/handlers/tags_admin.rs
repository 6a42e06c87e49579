//! Admin tag curation: list, create, update, delete, merge.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use waymark_core::{
    Error, ListTagsRequest, Tag, TagCategory, TagDeleteOutcome, TagMergeResult, TagRepository,
    UpdateTagRequest,
};

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTagsParams {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: Option<bool>,
}

#[derive(Serialize)]
pub struct ListTagsResponse {
    pub tags: Vec<Tag>,
    pub grouped: BTreeMap<String, Vec<Tag>>,
    pub categories: Vec<&'static str>,
}

pub async fn list_tags(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<ListTagsParams>,
) -> ApiResult<Json<ListTagsResponse>> {
    let tags = state
        .db
        .tags
        .list(ListTagsRequest {
            category: params.category.as_deref().map(TagCategory::parse_lenient),
            search: params.search,
            include_inactive: params.include_inactive.unwrap_or(false),
        })
        .await?;

    let mut grouped: BTreeMap<String, Vec<Tag>> = TagCategory::ALL
        .iter()
        .map(|c| (c.as_str().to_string(), Vec::new()))
        .collect();
    for tag in &tags {
        grouped
            .entry(tag.category.as_str().to_string())
            .or_default()
            .push(tag.clone());
    }

    Ok(Json(ListTagsResponse {
        tags,
        grouped,
        categories: TagCategory::ALL.iter().map(|c| c.as_str()).collect(),
    }))
}

#[derive(Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    pub category: TagCategory,
}

pub async fn create_tag(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<CreateTagRequest>,
) -> ApiResult<Json<Tag>> {
    if req.name.trim().is_empty() {
        return Err(Error::InvalidInput("Name and category are required".to_string()).into());
    }
    Ok(Json(state.db.tags.create(&req.name, req.category, false).await?))
}

#[derive(Deserialize)]
pub struct UpdateTagBody {
    pub id: Uuid,
    #[serde(flatten)]
    pub update: UpdateTagRequest,
}

pub async fn update_tag(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(body): Json<UpdateTagBody>,
) -> ApiResult<Json<Tag>> {
    Ok(Json(state.db.tags.update(body.id, body.update).await?))
}

#[derive(Deserialize)]
pub struct DeleteTagParams {
    pub id: Uuid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTagResponse {
    pub success: bool,
    pub soft_deleted: bool,
}

pub async fn delete_tag(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<DeleteTagParams>,
) -> ApiResult<Json<DeleteTagResponse>> {
    let outcome = state.db.tags.delete(params.id).await?;
    Ok(Json(DeleteTagResponse {
        success: true,
        soft_deleted: outcome == TagDeleteOutcome::SoftDeleted,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeTagsRequest {
    pub source_tag_id: Uuid,
    pub target_tag_id: Uuid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeTagsResponse {
    pub success: bool,
    pub merged_count: i64,
    pub target_tag: Tag,
}

pub async fn merge_tags(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<MergeTagsRequest>,
) -> ApiResult<Json<MergeTagsResponse>> {
    let TagMergeResult {
        merged_count,
        target,
    } = state
        .db
        .tags
        .merge(req.source_tag_id, req.target_tag_id)
        .await?;

    Ok(Json(MergeTagsResponse {
        success: true,
        merged_count,
        target_tag: target,
    }))
}
