use axum::{
    extract::{Path, State},
    Extension,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::cache::keys;
use crate::database::models::TeamMeeting;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::meeting_service::MeetingInput;
use crate::services::MeetingService;

use super::MEETING_ROLES;

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request("Invalid meeting id"))
}

/// PUT /api/team-meetings/:id - partial update
pub async fn put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<MeetingInput>,
) -> ApiResult<TeamMeeting> {
    auth.require_role(MEETING_ROLES)?;

    let meeting = MeetingService::new(state.pool.clone())
        .update(parse_id(&id)?, input)
        .await?;
    state.cache.invalidate_prefix(keys::TEAM_MEETINGS).await;

    Ok(ApiResponse::success(meeting).message("Meeting updated"))
}

/// DELETE /api/team-meetings/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    auth.require_role(MEETING_ROLES)?;

    let id = parse_id(&id)?;
    MeetingService::new(state.pool.clone()).delete(id).await?;
    state.cache.invalidate_prefix(keys::TEAM_MEETINGS).await;
    tracing::info!(meeting_id = %id, by = %auth.login, "Team meeting deleted");

    Ok(ApiResponse::success(()).message("Meeting deleted"))
}
