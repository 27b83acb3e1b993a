use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::cache::keys;
use crate::database::models::TeamMeeting;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::meeting_service::MeetingInput;
use crate::services::MeetingService;

use super::MEETING_ROLES;

#[derive(Debug, Serialize, Deserialize)]
pub struct MeetingList {
    pub meetings: Vec<TeamMeeting>,
    pub total: usize,
}

/// GET /api/team-meetings - all meetings, newest first
pub async fn get(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<MeetingList> {
    auth.require_role(MEETING_ROLES)?;

    let service = MeetingService::new(state.pool.clone());
    let key = format!("{}all", keys::TEAM_MEETINGS);
    let list = state
        .cache
        .cached(&key, None, || async {
            let meetings = service.list().await?;
            Ok::<_, ApiError>(MeetingList {
                total: meetings.len(),
                meetings,
            })
        })
        .await?;

    Ok(ApiResponse::success(list))
}

/// POST /api/team-meetings - log a meeting
pub async fn post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(input): ApiJson<MeetingInput>,
) -> ApiResult<TeamMeeting> {
    auth.require_role(MEETING_ROLES)?;

    let meeting = MeetingService::new(state.pool.clone())
        .create(auth.user_id, input.into_new()?)
        .await?;
    state.cache.invalidate_prefix(keys::TEAM_MEETINGS).await;

    Ok(ApiResponse::created(meeting).message("Meeting created"))
}
