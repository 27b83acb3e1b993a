use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::api::{Paginated, Pagination};
use crate::app::AppState;
use crate::auth::{self, Role};
use crate::cache::keys;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{extract_token, ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::{NewUser, UserFilter};
use crate::services::UserService;

use super::{parse_city, parse_role};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub city: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub login: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub city: Option<String>,
    pub salary: Option<Decimal>,
    pub currency: Option<String>,
    pub secret: Option<String>,
}

/// GET /api/users - filtered, paginated user list (ADMIN, COUNTRY_MANAGER)
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Paginated<User>> {
    auth.require_role(&[Role::Admin, Role::CountryManager])?;

    let filter = UserFilter {
        city: query.city.as_deref().filter(|c| !c.is_empty()).map(parse_city).transpose()?,
        role: query.role.as_deref().filter(|r| !r.is_empty()).map(parse_role).transpose()?,
        is_active: match query.is_active.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        },
    };
    let page = Pagination::from_params(query.page.as_deref(), query.limit.as_deref());

    let key = format!(
        "{}{}:{}:{}:{}:{}",
        keys::USERS,
        filter.city.as_deref().unwrap_or("*"),
        filter.role.map(|r| r.as_str()).unwrap_or("*"),
        filter.is_active.map(|a| a.to_string()).unwrap_or_else(|| "*".into()),
        page.page,
        page.limit
    );

    let users = UserService::new(state.pool.clone());
    let result = state
        .cache
        .cached(&key, None, || async {
            let (rows, total) = users.list(&filter, page).await?;
            Ok::<_, ApiError>(Paginated::new(rows, page, total))
        })
        .await?;

    Ok(ApiResponse::success(result))
}

/// POST /api/users - create a user
///
/// Allowed with a matching `secret` (when a registration secret is
/// configured) or with an ADMIN session.
pub async fn post(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> ApiResult<User> {
    authorize_creation(&state, &jar, &headers, payload.secret.as_deref())?;

    let login = payload.login.as_deref().map(str::trim).unwrap_or_default();
    let password = payload.password.clone().unwrap_or_default();
    let name = payload.name.as_deref().map(str::trim).unwrap_or_default();
    let (Some(role), Some(city)) = (payload.role.as_deref(), payload.city.as_deref()) else {
        return Err(ApiError::bad_request("Required fields: login, password, name, role, city"));
    };
    if login.is_empty() || password.is_empty() || name.is_empty() {
        return Err(ApiError::bad_request("Required fields: login, password, name, role, city"));
    }

    let role = parse_role(role)?;
    let city = parse_city(city)?;

    let password_hash = auth::hash_password(password, state.config.security.bcrypt_cost)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            ApiError::internal_server_error("Failed to hash password")
        })?;

    let users = UserService::new(state.pool.clone());
    let user = users
        .create(NewUser {
            login: login.to_string(),
            password_hash,
            email: payload.email.filter(|e| !e.trim().is_empty()),
            name: name.to_string(),
            role,
            city,
            salary_gross: payload.salary,
            currency: payload.currency.unwrap_or_else(|| "PLN".to_string()),
        })
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::conflict("User with this login already exists"),
            other => other,
        })?;

    state.cache.invalidate_prefix(keys::USERS).await;
    state.cache.invalidate_prefix(keys::DASHBOARD_STATS).await;

    Ok(ApiResponse::created(user))
}

fn authorize_creation(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
    secret: Option<&str>,
) -> Result<(), ApiError> {
    let security = &state.config.security;

    let expected = security.registration_secret.as_deref().filter(|s| !s.is_empty());
    if let (Some(expected), Some(given)) = (expected, secret) {
        if auth::secret_matches(expected, given) {
            tracing::info!("User creation authorized by registration secret");
            return Ok(());
        }
        tracing::warn!("User creation with wrong registration secret");
    }

    let token = extract_token(jar, headers).ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
    let claims = auth::validate_jwt(&token, &security.jwt_secret)?;
    AuthUser::from(claims).require_role(&[Role::Admin])
}
