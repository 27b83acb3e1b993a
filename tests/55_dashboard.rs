mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

use cleanwhale_analytics::auth::Role;
use cleanwhale_analytics::cache::Cache;
use cleanwhale_analytics::services::dashboard_service::DashboardTotals;

fn stats_request(role: Role, city: &str) -> Request<Body> {
    let token = common::token_for(role, city);
    Request::builder()
        .uri("/api/dashboard-stats")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn country_totals_are_shared_but_caller_fields_are_not() {
    let cache = Cache::in_memory(Duration::from_secs(60));
    let totals = DashboardTotals { total_users: 120, weekly_hires: 9 };
    cache.set("dashboard-stats:country", &totals, None).await;

    for city in ["WARSAW", "KRAKOW"] {
        let res = common::app_with_cache(cache.clone())
            .oneshot(stats_request(Role::CountryManager, city))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = common::json_body(res).await;
        assert_eq!(body["data"]["totalUsers"], 120);
        assert_eq!(body["data"]["weeklyHires"], 9);
        assert_eq!(body["data"]["userCity"], city);
        assert_eq!(body["data"]["userRole"], "COUNTRY_MANAGER");
        assert_eq!(body["data"]["isCountryManager"], true);
    }
}

#[tokio::test]
async fn city_totals_are_keyed_by_city() {
    let cache = Cache::in_memory(Duration::from_secs(60));
    let totals = DashboardTotals { total_users: 4, weekly_hires: 1 };
    cache.set("dashboard-stats:city:GDANSK", &totals, None).await;

    let res = common::app_with_cache(cache.clone())
        .oneshot(stats_request(Role::MixedManager, "GDANSK"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = common::json_body(res).await;
    assert_eq!(body["data"]["totalUsers"], 4);
    assert_eq!(body["data"]["allowedCities"], serde_json::json!(["GDANSK"]));

    // Another city misses the cache and reaches the (unreachable) database
    let res = common::app_with_cache(cache)
        .oneshot(stats_request(Role::MixedManager, "LODZ"))
        .await
        .unwrap();
    assert_ne!(res.status(), StatusCode::OK);
}
