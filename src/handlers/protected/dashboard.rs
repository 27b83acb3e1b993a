// handlers/protected/dashboard.rs - GET /api/dashboard-stats

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::auth::permissions::{self, DataScope};
use crate::cache::keys;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::dashboard_service::DashboardStats;
use crate::services::DashboardService;

/// Totals are cached per data scope; the caller's own fields never are.
pub fn totals_key(scope: &DataScope) -> String {
    match scope {
        DataScope::All => format!("{}country", keys::DASHBOARD_STATS),
        DataScope::City(city) => format!("{}city:{city}", keys::DASHBOARD_STATS),
        DataScope::Own(user_id) => format!("{}user:{user_id}", keys::DASHBOARD_STATS),
    }
}

/// GET /api/dashboard-stats - user and hiring totals for the caller's scope
pub async fn dashboard_stats_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<DashboardStats> {
    let scope = permissions::data_scope(auth.claims());
    let service = DashboardService::new(state.pool.clone());
    let totals = state
        .cache
        .cached(&totals_key(&scope), None, || async {
            Ok::<_, ApiError>(service.totals(&scope).await?)
        })
        .await?;

    Ok(ApiResponse::success(DashboardStats::for_caller(totals, auth.claims())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, Role};
    use uuid::Uuid;

    fn key_for(role: Role, city: &str) -> String {
        let claims = Claims::new(Uuid::new_v4(), "u".into(), role, city.into(), 1);
        totals_key(&permissions::data_scope(&claims))
    }

    #[test]
    fn keys_depend_only_on_scope() {
        assert_eq!(key_for(Role::CountryManager, "WARSAW"), "dashboard-stats:country");
        assert_eq!(key_for(Role::CountryManager, "KRAKOW"), key_for(Role::Admin, "LODZ"));

        assert_eq!(key_for(Role::HiringManager, "GDANSK"), "dashboard-stats:city:GDANSK");
        assert_eq!(key_for(Role::HiringManager, "GDANSK"), key_for(Role::OpsManager, "GDANSK"));
        assert_ne!(key_for(Role::MixedManager, "GDANSK"), key_for(Role::MixedManager, "LODZ"));
    }
}
