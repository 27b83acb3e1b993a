// handlers/protected/cities.rs - GET /api/cities

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::cache::keys;
use crate::database::models::City;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::DashboardService;

/// GET /api/cities - active cities, any session
pub async fn cities_get(State(state): State<AppState>, Extension(_auth): Extension<AuthUser>) -> ApiResult<Vec<City>> {
    let service = DashboardService::new(state.pool.clone());
    let key = format!("{}active", keys::CITIES);

    let cities = state
        .cache
        .cached(&key, None, || async { Ok::<_, ApiError>(service.active_cities().await?) })
        .await?;

    Ok(ApiResponse::success(cities))
}
