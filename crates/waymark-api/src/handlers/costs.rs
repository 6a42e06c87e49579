//! Admin usage-ledger reporting.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use waymark_core::{defaults, ApiUsageLog, UsagePeriod, UsageRepository, UsageSummary};

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostsParams {
    #[serde(default)]
    pub period: Option<UsagePeriod>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub page: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

#[derive(Serialize)]
pub struct CostsResponse {
    pub summary: UsageSummary,
    pub logs: Vec<ApiUsageLog>,
    pub pagination: Pagination,
}

pub async fn costs(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<CostsParams>,
) -> ApiResult<Json<CostsResponse>> {
    let period = params.period.unwrap_or_default();
    let service = params.service.as_deref().filter(|s| *s != "all");
    let page = params.page.unwrap_or(1).max(1);

    let summary = state
        .db
        .usage
        .summary(period, service, params.user_id)
        .await?;
    let (logs, total_count) = state
        .db
        .usage
        .list(period, service, params.user_id, page)
        .await?;

    let limit = defaults::USAGE_PAGE_SIZE;
    Ok(Json(CostsResponse {
        summary,
        logs,
        pagination: Pagination {
            page,
            limit,
            total_count,
            total_pages: (total_count + limit - 1) / limit,
        },
    }))
}
