// handlers/public/health.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::DatabaseManager;

/// GET / - service name, version and route overview
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "CleanWhale Analytics",
            "version": version,
            "environment": format!("{:?}", state.config.environment).to_lowercase(),
            "endpoints": {
                "health": "/health (public)",
                "auth": "/api/auth/login, /api/auth/logout (public), /api/auth/me (session)",
                "users": "/api/users[/:id] (ADMIN, COUNTRY_MANAGER)",
                "cities": "/api/cities (session)",
                "weekly_reports": "/api/weekly-reports[/:week] (session)",
                "team_meetings": "/api/team-meetings[/:id] (COUNTRY_MANAGER, ADMIN)",
                "country_aggregates": "/api/country-aggregates (COUNTRY_MANAGER, ADMIN)",
                "dashboard_stats": "/api/dashboard-stats (session)",
                "cron": "/api/cron/weekly-report (cron secret)",
                "dashboard": "/dashboard/** (page session)",
            }
        }
    }))
}

/// GET /health - database ping plus cache backend status
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let (database, cache) = futures::join!(
        DatabaseManager::health_check(&state.pool),
        state.cache.health_check()
    );
    let cache = match cache {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("degraded: {e}"),
    };

    match database {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "cache": cache,
                    "cacheBackend": state.cache.backend_name(),
                }
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": true,
                    "message": "Database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable",
                        "cache": cache,
                    }
                })),
            )
        }
    }
}
