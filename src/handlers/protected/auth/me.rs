// handlers/protected/auth/me.rs - GET /api/auth/me

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    Extension,
};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Role;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::UserService;

pub const FALLBACK_HEADER: &str = "x-auth-me-fallback";

/// Session view built from the token alone.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub login: String,
    pub role: Role,
    pub city: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Me {
    Fresh(User),
    FromToken(SessionUser),
}

/// GET /api/auth/me - the caller, freshly loaded from the database
///
/// A deleted or deactivated account is 401. When the database cannot be
/// reached the token claims are returned instead, marked with
/// `X-Auth-Me-Fallback: jwt`.
pub async fn me_get(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<Me> {
    let users = UserService::new(state.pool.clone());

    match users.find_by_id(auth.user_id).await {
        Ok(Some(user)) if user.is_active => Ok(ApiResponse::success(Me::Fresh(user))),
        Ok(_) => {
            tracing::warn!(user_id = %auth.user_id, login = %auth.login, "Session for missing or inactive user");
            Err(ApiError::unauthorized("User not found or inactive"))
        }
        Err(e) => {
            tracing::warn!(user_id = %auth.user_id, error = %e, "User lookup failed, answering from token");
            let session = SessionUser {
                id: auth.user_id,
                login: auth.login.clone(),
                role: auth.role,
                city: auth.city.clone(),
            };
            Ok(ApiResponse::success(Me::FromToken(session))
                .header(HeaderName::from_static(FALLBACK_HEADER), HeaderValue::from_static("jwt")))
        }
    }
}
