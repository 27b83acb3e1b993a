use axum::{
    extract::{Query, State},
    Extension,
};

use crate::app::AppState;
use crate::cache::keys;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::report_service::{ReportBundle, ReportSubmission};
use crate::services::ReportService;
use crate::week::IsoWeek;

use super::{view, ViewQuery, WeeklyReportResponse};

/// GET /api/weekly-reports?week=&role= - own report, current week by default
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<WeeklyReportResponse> {
    let week = match query.week.as_deref().filter(|w| !w.is_empty()) {
        Some(w) => IsoWeek::parse(w)?,
        None => IsoWeek::current(),
    };

    let bundle = ReportService::new(state.pool.clone()).find(auth.user_id, week).await?;
    Ok(ApiResponse::success(view(week, auth.role, query.role.as_deref(), bundle)?))
}

/// POST /api/weekly-reports - file the caller's report for a week
///
/// A second report for the same week is 409; use PUT to change it.
pub async fn post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(submission): ApiJson<ReportSubmission>,
) -> ApiResult<ReportBundle> {
    let week_iso = submission
        .week_iso
        .as_deref()
        .ok_or_else(|| ApiError::field("weekIso", "This field is required"))?;
    let week = IsoWeek::parse(week_iso)?;
    let kind = submission.validate(auth.role)?;

    let bundle = ReportService::new(state.pool.clone())
        .create(auth.user_id, week, kind, &submission)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::conflict("Report for this week already exists"),
            other => other,
        })?;

    state.cache.invalidate_prefix(keys::DASHBOARD_STATS).await;

    Ok(ApiResponse::created(bundle).message("Report saved"))
}
