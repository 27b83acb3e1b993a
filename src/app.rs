// app.rs - Shared state and the HTTP router
//
// Route groups mirror the handler tiers: public, protected (JWT layer), cron
// (bearer secret checked in the handler) and the dashboard pages behind the
// page session guard.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::cache::Cache;
use crate::config::AppConfig;
use crate::handlers::{cron, protected, public};
use crate::middleware::{jwt_auth_middleware, page_guard};
use crate::telegram::TelegramClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: PgPool,
    pub cache: Cache,
    pub telegram: TelegramClient,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool, cache: Cache) -> Self {
        let telegram = TelegramClient::new(&config.telegram);
        Self {
            config: Arc::new(config),
            pool,
            cache,
            telegram,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(public_auth_routes())
        .merge(protected_routes(&state))
        .merge(cron_routes())
        .merge(page_routes(&state))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login_post))
        .route("/api/auth/logout", post(auth::logout_post))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    use protected::{
        auth, cities, country_aggregates, dashboard, team_meetings, users, weekly_reports,
    };

    Router::new()
        .route("/api/auth/me", get(auth::me_get))
        .route("/api/users", get(users::users_get))
        .route(
            "/api/users/:id",
            get(users::user_get).put(users::user_put).delete(users::user_delete),
        )
        .route("/api/cities", get(cities::cities_get))
        .route(
            "/api/weekly-reports",
            get(weekly_reports::weekly_reports_get).post(weekly_reports::weekly_reports_post),
        )
        .route(
            "/api/weekly-reports/:week",
            get(weekly_reports::weekly_report_get).put(weekly_reports::weekly_report_put),
        )
        .route(
            "/api/team-meetings",
            get(team_meetings::team_meetings_get).post(team_meetings::team_meetings_post),
        )
        .route(
            "/api/team-meetings/:id",
            put(team_meetings::team_meeting_put).delete(team_meetings::team_meeting_delete),
        )
        .route(
            "/api/country-aggregates",
            get(country_aggregates::country_aggregates_get).post(country_aggregates::country_aggregates_post),
        )
        .route("/api/dashboard-stats", get(dashboard::dashboard_stats_get))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
        // Registration secret or admin session, checked in the handler
        .route("/api/users", post(users::users_post))
}

fn cron_routes() -> Router<AppState> {
    Router::new().route("/api/cron/weekly-report", get(cron::weekly_report_get))
}

fn page_routes(state: &AppState) -> Router<AppState> {
    let root = &state.config.server.dashboard_dir;

    let dashboard = Router::new()
        .nest_service(
            "/dashboard",
            ServeDir::new(root.join("dashboard")).append_index_html_on_directories(true),
        )
        .layer(from_fn_with_state(state.clone(), page_guard));

    Router::new()
        .route_service("/login", ServeFile::new(root.join("login.html")))
        .merge(dashboard)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
