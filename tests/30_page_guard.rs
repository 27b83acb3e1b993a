mod common;

use axum::{body::Body, http::{header, Request, StatusCode}};
use cleanwhale_analytics::auth::Role;

fn location(res: &axum::http::Response<Body>) -> String {
    res.headers()[header::LOCATION].to_str().unwrap().to_string()
}

#[tokio::test]
async fn dashboard_without_session_redirects_to_login() {
    let res = common::send(common::get("/dashboard")).await;
    assert!(res.status().is_redirection());
    assert_eq!(location(&res), "/login?redirect=%2Fdashboard");
}

#[tokio::test]
async fn invalid_session_is_dropped_and_flagged() {
    let token = common::token_signed_with(Role::Admin, "WARSAW", "not-the-server-secret-0123456789");
    let req = Request::builder()
        .uri("/dashboard/")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();

    let res = common::send(req).await;
    assert!(res.status().is_redirection());
    assert_eq!(location(&res), "/login?redirect=%2Fdashboard%2F&reason=expired");

    let cleared = res.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.starts_with("token="));
}

#[tokio::test]
async fn valid_session_serves_the_dashboard() {
    let token = common::token_for(Role::HiringManager, "GDANSK");
    let req = Request::builder()
        .uri("/dashboard/")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();

    let res = common::send(req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_page_is_public() {
    let res = common::send(common::get("/login")).await;
    assert_eq!(res.status(), StatusCode::OK);
}
