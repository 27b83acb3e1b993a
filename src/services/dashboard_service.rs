use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::permissions::{self, DataScope};
use crate::auth::{Claims, Role};
use crate::database::models::City;
use crate::database::DatabaseError;

/// Counts shared by every caller with the same data scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    pub total_users: i64,
    pub weekly_hires: i64,
}

/// Header numbers of the dashboard landing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub weekly_hires: i64,
    pub user_role: Role,
    pub user_city: String,
    pub allowed_cities: Vec<String>,
    pub is_country_manager: bool,
}

impl DashboardStats {
    /// Totals come from the scope; everything else from the caller's own claims.
    pub fn for_caller(totals: DashboardTotals, claims: &Claims) -> Self {
        Self {
            total_users: totals.total_users,
            weekly_hires: totals.weekly_hires,
            user_role: claims.role,
            user_city: claims.city.clone(),
            allowed_cities: permissions::allowed_cities(claims),
            is_country_manager: permissions::is_manager(claims),
        }
    }
}

pub struct DashboardService {
    pool: PgPool,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Country-wide for `All`, one city for `City`, a single user for `Own`.
    pub async fn totals(&self, scope: &DataScope) -> Result<DashboardTotals, DatabaseError> {
        let (city, user_id): (Option<&str>, Option<Uuid>) = match scope {
            DataScope::All => (None, None),
            DataScope::City(city) => (Some(city.as_str()), None),
            DataScope::Own(id) => (None, Some(*id)),
        };

        let (total_users,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users
             WHERE ($1::text IS NULL OR city = $1)
               AND ($2::uuid IS NULL OR id = $2)",
        )
        .bind(city)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        // Registrations from reports submitted in the last seven days
        let (weekly_hires,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(h.registrations), 0)::bigint
             FROM weekly_reports r
             JOIN users u ON u.id = r.user_id
             JOIN hr_metrics h ON h.report_id = r.id
             WHERE r.created_at >= now() - interval '7 days'
               AND ($1::text IS NULL OR u.city = $1)
               AND ($2::uuid IS NULL OR r.user_id = $2)",
        )
        .bind(city)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardTotals { total_users, weekly_hires })
    }

    pub async fn active_cities(&self) -> Result<Vec<City>, DatabaseError> {
        let cities = sqlx::query_as::<_, City>(
            "SELECT id, code, name, is_active FROM cities WHERE is_active ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(cities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_fields_come_from_claims() {
        let totals = DashboardTotals { total_users: 40, weekly_hires: 7 };
        let claims = Claims::new(Uuid::new_v4(), "cm".into(), Role::CountryManager, "KRAKOW".into(), 1);

        let stats = DashboardStats::for_caller(totals, &claims);
        assert_eq!(stats.total_users, 40);
        assert_eq!(stats.weekly_hires, 7);
        assert_eq!(stats.user_city, "KRAKOW");
        assert_eq!(stats.user_role, Role::CountryManager);
        assert!(stats.is_country_manager);
        assert_eq!(stats.allowed_cities.len(), permissions::CITIES.len());
    }
}
