// handlers/public/auth/login.rs - POST /api/auth/login

use axum::{extract::State, http::header};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::{self, Claims};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{session_cookie, ApiJson, ApiResponse, ApiResult};
use crate::services::UserService;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/login - check credentials, issue a session token
///
/// The token is returned in the body and set as the `token` cookie
/// (HttpOnly, SameSite=Lax, Secure when configured).
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let login = payload.login.unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    if login.trim().is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Login and password are required"));
    }

    let users = UserService::new(state.pool.clone());
    let user = users.find_by_login(&login).await?.filter(|u| u.is_active);

    let Some(user) = user else {
        tracing::warn!(login = %login.trim(), "Login failed: unknown or inactive user");
        return Err(ApiError::unauthorized("Invalid login or password"));
    };

    let verified = auth::verify_password(password, user.password_hash.clone())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password verification task failed");
            ApiError::internal_server_error("Failed to verify password")
        })?;

    if !verified {
        tracing::warn!(login = %user.login, "Login failed: wrong password");
        return Err(ApiError::unauthorized("Invalid login or password"));
    }

    let security = &state.config.security;
    let claims = Claims::new(
        user.id,
        user.login.clone(),
        user.role,
        user.city.clone(),
        security.jwt_expiry_hours,
    );
    let token = auth::generate_jwt(&claims, &security.jwt_secret)?;
    let cookie = session_cookie(&token, security.jwt_expiry_hours * 3600, security.secure_cookies)?;

    tracing::info!(login = %user.login, user_id = %user.id, role = %user.role, "Login succeeded");

    Ok(ApiResponse::success(LoginResponse { token, user }).header(header::SET_COOKIE, cookie))
}
