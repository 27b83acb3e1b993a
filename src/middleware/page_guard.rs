// middleware/page_guard.rs - Session check in front of the dashboard pages
//
// Browsers get redirected to the login page instead of a JSON 401. A token that
// fails verification is also dropped from the cookie jar so the login page
// starts clean.

use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::app::AppState;
use crate::auth;

use super::auth::{extract_token, AuthUser, TOKEN_COOKIE};

pub const LOGIN_PATH: &str = "/login";

pub async fn page_guard(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = original_uri.path().to_string();

    let Some(token) = extract_token(&jar, request.headers()) else {
        tracing::debug!(path = %path, "No session, redirecting to login");
        return Redirect::to(&login_url(&path, false)).into_response();
    };

    match auth::validate_jwt(&token, &state.config.security.jwt_secret) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthUser::from(claims));
            next.run(request).await
        }
        Err(e) => {
            tracing::info!(path = %path, error = %e, "Invalid or expired session, redirecting to login");
            let jar = jar.remove(Cookie::build(TOKEN_COOKIE).path("/"));
            (jar, Redirect::to(&login_url(&path, true))).into_response()
        }
    }
}

/// `/login?redirect=<path>[&reason=expired]`
pub fn login_url(redirect: &str, expired: bool) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("redirect", redirect);
    if expired {
        query.append_pair("reason", "expired");
    }
    format!("{}?{}", LOGIN_PATH, query.finish())
}
