// handlers/protected/country_aggregates.rs - Country grid (COUNTRY_MANAGER, ADMIN)

use axum::{
    extract::{Query, State},
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::Role;
use crate::cache::keys;
use crate::database::models::CountryAggregate;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::aggregate_service::{AggregateBatch, CityAggregate};
use crate::services::AggregateService;
use crate::week::IsoWeek;

const AGGREGATE_ROLES: &[Role] = &[Role::CountryManager, Role::Admin];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekQuery {
    pub week_iso: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryGrid {
    pub week_iso: String,
    pub cities: Vec<CityAggregate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAggregates {
    pub week_iso: IsoWeek,
    pub updated: usize,
    pub items: Vec<CountryAggregate>,
}

/// GET /api/country-aggregates?weekIso= - every active city, zeros when missing
pub async fn country_aggregates_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<WeekQuery>,
) -> ApiResult<CountryGrid> {
    auth.require_role(AGGREGATE_ROLES)?;

    let week_iso = query
        .week_iso
        .filter(|w| !w.is_empty())
        .ok_or_else(|| ApiError::field("weekIso", "This query parameter is required"))?;
    let week = IsoWeek::parse(&week_iso)?;

    let service = AggregateService::new(state.pool.clone());
    let key = format!("{}{}", keys::COUNTRY_AGGREGATES, week);
    let grid = state
        .cache
        .cached(&key, None, || async {
            Ok::<_, ApiError>(CountryGrid {
                week_iso: week.to_string(),
                cities: service.for_week(week).await?,
            })
        })
        .await?;

    Ok(ApiResponse::success(grid))
}

/// POST /api/country-aggregates - `{weekIso, items[]}` batch upsert
pub async fn country_aggregates_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(batch): ApiJson<AggregateBatch>,
) -> ApiResult<SavedAggregates> {
    auth.require_role(AGGREGATE_ROLES)?;

    let (week, items) = batch.validate()?;
    let saved = AggregateService::new(state.pool.clone())
        .save_batch(week, &items, auth.user_id)
        .await?;

    state.cache.invalidate(&format!("{}{}", keys::COUNTRY_AGGREGATES, week)).await;

    Ok(ApiResponse::success(SavedAggregates {
        week_iso: week,
        updated: saved.len(),
        items: saved,
    })
    .message("City figures saved"))
}
