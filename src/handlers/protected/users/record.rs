use axum::{
    extract::{Path, State},
    Extension,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{self, Role};
use crate::cache::keys;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::UserChanges;
use crate::services::UserService;

use super::{parse_city, parse_role};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub password: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub city: Option<String>,
    pub salary: Option<Decimal>,
    pub currency: Option<String>,
    pub is_active: Option<bool>,
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request("Invalid user id"))
}

/// GET /api/users/:id - single user (ADMIN, COUNTRY_MANAGER)
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    auth.require_role(&[Role::Admin, Role::CountryManager])?;

    let user = UserService::new(state.pool.clone())
        .find_by_id(parse_id(&id)?)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(user))
}

/// PUT /api/users/:id - partial update, optional password reset (ADMIN)
pub async fn put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> ApiResult<User> {
    auth.require_role(&[Role::Admin])?;
    let id = parse_id(&id)?;

    let password_hash = match payload.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(
            auth::hash_password(password, state.config.security.bcrypt_cost)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Password hashing failed");
                    ApiError::internal_server_error("Failed to hash password")
                })?,
        ),
        None => None,
    };

    let changes = UserChanges {
        email: payload.email,
        name: payload.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        role: payload.role.as_deref().map(parse_role).transpose()?,
        city: payload.city.as_deref().map(parse_city).transpose()?,
        salary_gross: payload.salary,
        currency: payload.currency,
        is_active: payload.is_active,
        password_hash,
    };
    let reset = changes.password_hash.is_some();

    let user = UserService::new(state.pool.clone()).update(id, changes).await?;
    tracing::info!(user_id = %user.id, by = %auth.login, password_reset = reset, "User updated");

    state.cache.invalidate_prefix(keys::USERS).await;
    state.cache.invalidate_prefix(keys::DASHBOARD_STATS).await;

    Ok(ApiResponse::success(user))
}

/// DELETE /api/users/:id - deactivate (ADMIN)
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    auth.require_role(&[Role::Admin])?;
    let id = parse_id(&id)?;

    if id == auth.user_id {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }

    let user = UserService::new(state.pool.clone()).deactivate(id).await?;
    tracing::info!(user_id = %user.id, by = %auth.login, "User deactivated");

    state.cache.invalidate_prefix(keys::USERS).await;
    state.cache.invalidate_prefix(keys::DASHBOARD_STATS).await;

    Ok(ApiResponse::success(user).message("User deactivated"))
}
