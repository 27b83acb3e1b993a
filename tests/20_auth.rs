mod common;

use axum::{body::Body, http::{header, Request, StatusCode}};
use cleanwhale_analytics::auth::Role;

#[tokio::test]
async fn me_requires_a_session() {
    let res = common::send(common::get("/api/auth/me")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = common::json_body(res).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn me_rejects_token_signed_with_other_secret() {
    let token = common::token_signed_with(Role::Admin, "WARSAW", "some-other-secret-entirely-0123456789");
    let req = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let res = common::send(req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_falls_back_to_token_claims_without_database() {
    let token = common::token_for(Role::OpsManager, "KRAKOW");
    let req = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();

    let res = common::send(req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-auth-me-fallback"], "jwt");

    let body = common::json_body(res).await;
    assert_eq!(body["data"]["role"], "OPS_MANAGER");
    assert_eq!(body["data"]["city"], "KRAKOW");
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let res = common::send(common::post_json("/api/auth/logout", "{}")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn login_requires_both_fields() {
    let res = common::send(common::post_json("/api/auth/login", r#"{"login":"anna"}"#)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_rejects_malformed_json() {
    let res = common::send(common::post_json("/api/auth/login", "{not json")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_creation_needs_secret_or_admin() {
    let res = common::send(common::post_json(
        "/api/users",
        r#"{"login":"new.user","password":"secret123","name":"New User","role":"OPS_MANAGER","city":"WARSAW"}"#,
    ))
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn role_checks_run_before_the_database() {
    let token = common::token_for(Role::HiringManager, "WARSAW");
    let req = Request::builder()
        .uri("/api/country-aggregates?weekIso=2025-W02")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let res = common::send(req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_admins_create_users_by_session() {
    let token = common::token_for(Role::CountryManager, "WARSAW");
    let req = Request::builder()
        .method("POST")
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::from(r#"{"login":"x","password":"y","name":"Z","role":"ADMIN","city":"WARSAW"}"#))
        .unwrap();

    let res = common::send(req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn registration_secret_must_match_exactly() {
    // Accepted secret gets past authorization to field validation
    let res = common::send(common::post_json(
        "/api/users",
        r#"{"secret":"integration-tests-registration","login":"new.user"}"#,
    ))
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    for wrong in ["integration-tests-registratioN", "integration-tests-registration-2", ""] {
        let body = format!(r#"{{"secret":"{wrong}","login":"new.user"}}"#);
        let res = common::send(common::post_json("/api/users", &body)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "secret {wrong:?}");
    }
}
