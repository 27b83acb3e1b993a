mod common;

use axum::{body::Body, http::{header, Request, StatusCode}};

fn cron_request(auth: Option<&str>, query: &str) -> Request<Body> {
    let mut builder = Request::builder().uri(format!("/api/cron/weekly-report{query}"));
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn cron_requires_bearer_secret() {
    let res = common::send(cron_request(None, "")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cron_rejects_wrong_secret() {
    let res = common::send(cron_request(Some("Bearer wrong"), "")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn vercel_header_alone_is_not_enough() {
    let req = Request::builder()
        .uri("/api/cron/weekly-report")
        .header("x-vercel-cron", "1")
        .body(Body::empty())
        .unwrap();

    let res = common::send(req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cron_validates_week_parameter() {
    let bearer = format!("Bearer {}", common::CRON_SECRET);
    let res = common::send(cron_request(Some(&bearer), "?week=2025-W60")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cron_fails_without_telegram() {
    let bearer = format!("Bearer {}", common::CRON_SECRET);
    let res = common::send(cron_request(Some(&bearer), "")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
