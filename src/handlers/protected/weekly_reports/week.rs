use axum::{
    extract::{Path, Query, State},
    Extension,
};

use crate::app::AppState;
use crate::cache::keys;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::report_service::{ReportBundle, ReportSubmission};
use crate::services::ReportService;
use crate::week::IsoWeek;

use super::{view, ViewQuery, WeeklyReportResponse};

/// GET /api/weekly-reports/:week?role= - own report for the given week
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(week): Path<String>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<WeeklyReportResponse> {
    let week = IsoWeek::parse(&week)?;
    let bundle = ReportService::new(state.pool.clone()).find(auth.user_id, week).await?;
    Ok(ApiResponse::success(view(week, auth.role, query.role.as_deref(), bundle)?))
}

/// PUT /api/weekly-reports/:week - update an existing report and upsert its metrics
pub async fn put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(week): Path<String>,
    ApiJson(submission): ApiJson<ReportSubmission>,
) -> ApiResult<ReportBundle> {
    let week = IsoWeek::parse(&week)?;
    if let Some(body_week) = submission.week_iso.as_deref() {
        if IsoWeek::parse(body_week)? != week {
            return Err(ApiError::field("weekIso", "Does not match the week in the path"));
        }
    }
    let kind = submission.validate(auth.role)?;

    let bundle = ReportService::new(state.pool.clone())
        .update(auth.user_id, week, kind, &submission)
        .await
        .map_err(|e| match e {
            DatabaseError::NotFound(_) => ApiError::not_found("Report for this week not found"),
            other => ApiError::from(other),
        })?;

    state.cache.invalidate_prefix(keys::DASHBOARD_STATS).await;

    Ok(ApiResponse::success(bundle).message("Report updated"))
}
