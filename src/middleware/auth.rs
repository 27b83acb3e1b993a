use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::ops::Deref;

use crate::app::AppState;
use crate::auth::{self, permissions, Claims, JwtError, Permission, Role};
use crate::error::ApiError;

/// Name of the session cookie set by `/api/auth/login`.
pub const TOKEN_COOKIE: &str = "token";

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> Result<HeaderValue, ApiError> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{TOKEN_COOKIE}={token}; HttpOnly{secure}; Path=/; SameSite=Lax; Max-Age={max_age_secs}"
    ))
    .map_err(|_| ApiError::internal_server_error("Failed to build session cookie"))
}

/// `Set-Cookie` value that expires the session cookie.
pub fn cleared_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("token=; HttpOnly; Secure; Path=/; SameSite=Lax; Max-Age=0")
    } else {
        HeaderValue::from_static("token=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
    }
}

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    claims: Claims,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { claims }
    }
}

impl Deref for AuthUser {
    type Target = Claims;

    fn deref(&self) -> &Claims {
        &self.claims
    }
}

impl AuthUser {
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn require_role(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.claims.role) {
            Ok(())
        } else {
            tracing::warn!(login = %self.claims.login, role = %self.claims.role, "Role not allowed");
            Err(ApiError::forbidden("Insufficient permissions"))
        }
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), ApiError> {
        if permissions::has_permission(&self.claims, permission) {
            Ok(())
        } else {
            tracing::warn!(login = %self.claims.login, ?permission, "Permission denied");
            Err(ApiError::forbidden("Insufficient permissions"))
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&jar, request.headers()).ok_or_else(|| {
        tracing::debug!(path = %request.uri().path(), "Request without session token");
        ApiError::unauthorized("Not authenticated")
    })?;

    let claims = auth::validate_jwt(&token, &state.config.security.jwt_secret).map_err(|e| {
        if !matches!(e, JwtError::Expired) {
            tracing::warn!(path = %request.uri().path(), error = %e, "Rejected session token");
        }
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Session token from the `token` cookie, falling back to `Authorization: Bearer`.
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    bearer_token(headers).map(str::to_string)
}

/// Token part of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Cookie;
    use uuid::Uuid;

    fn headers(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn cookie_wins_over_header() {
        let jar = CookieJar::new().add(Cookie::new(TOKEN_COOKIE, "from-cookie"));
        let token = extract_token(&jar, &headers("Bearer from-header"));
        assert_eq!(token.as_deref(), Some("from-cookie"));
    }

    #[test]
    fn falls_back_to_bearer_header() {
        let token = extract_token(&CookieJar::new(), &headers("Bearer abc.def.ghi"));
        assert_eq!(token.as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn ignores_other_schemes_and_empty_tokens() {
        assert_eq!(extract_token(&CookieJar::new(), &headers("Basic dXNlcg==")), None);
        assert_eq!(extract_token(&CookieJar::new(), &headers("Bearer   ")), None);
        assert_eq!(extract_token(&CookieJar::new(), &HeaderMap::new()), None);
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc", 604800, true).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "token=abc; HttpOnly; Secure; Path=/; SameSite=Lax; Max-Age=604800"
        );

        let cookie = session_cookie("abc", 60, false).unwrap();
        assert!(!cookie.to_str().unwrap().contains("Secure"));
        assert!(cleared_session_cookie(false).to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn role_and_permission_checks() {
        let user = AuthUser::from(Claims::new(Uuid::new_v4(), "kasia".into(), Role::OpsManager, "LODZ".into(), 1));
        assert!(user.require_role(&[Role::OpsManager, Role::Admin]).is_ok());
        assert!(user.require_role(&[Role::Admin]).is_err());
        assert!(user.require_permission(Permission::CreateOwnMetrics).is_ok());
        assert!(user.require_permission(Permission::ManageUsers).is_err());
        assert_eq!(user.city, "LODZ");
    }
}
