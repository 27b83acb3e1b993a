// handlers/public/auth/logout.rs - POST /api/auth/logout

use axum::{extract::State, http::header};

use crate::app::AppState;
use crate::middleware::{cleared_session_cookie, ApiResponse};

/// POST /api/auth/logout - expire the session cookie
///
/// Public so a browser with an already expired token can still clear it.
pub async fn logout_post(State(state): State<AppState>) -> ApiResponse<()> {
    ApiResponse::success(())
        .message("Logged out")
        .header(header::SET_COOKIE, cleared_session_cookie(state.config.security.secure_cookies))
}
