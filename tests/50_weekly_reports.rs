mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use cleanwhale_analytics::auth::Role;

fn authed(method: &str, uri: &str, role: Role, body: Option<&str>) -> Request<Body> {
    let token = common::token_for(role, "WARSAW");
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn reports_require_a_session() {
    let res = common::send(common::get("/api/weekly-reports")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn out_of_range_week_is_rejected() {
    let res = common::send(authed("GET", "/api/weekly-reports?week=2025-W54", Role::OpsManager, None)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = common::json_body(res).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn create_requires_week() {
    let res = common::send(authed(
        "POST",
        "/api/weekly-reports",
        Role::OpsManager,
        Some(r#"{"role":"ops","ops":{"orders":3}}"#),
    ))
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ops_manager_cannot_file_hr_metrics() {
    let res = common::send(authed(
        "POST",
        "/api/weekly-reports",
        Role::OpsManager,
        Some(r#"{"weekIso":"2025-W03","role":"hr","hr":{"interviews":2}}"#),
    ))
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn stress_level_is_bounded() {
    let res = common::send(authed(
        "POST",
        "/api/weekly-reports",
        Role::HiringManager,
        Some(r#"{"weekIso":"2025-W03","role":"hr","hr":{},"base":{"stressLevel":11}}"#),
    ))
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_week_must_match_path() {
    let res = common::send(authed(
        "PUT",
        "/api/weekly-reports/2025-W03",
        Role::MixedManager,
        Some(r#"{"weekIso":"2025-W04","role":"mixed","hr":{},"ops":{}}"#),
    ))
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
