// Runs against the database at DATABASE_URL; every test returns early when it is unset.

mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use uuid::Uuid;

use cleanwhale_analytics::auth::Role;
use cleanwhale_analytics::database::models::User;
use cleanwhale_analytics::services::job_lock::default_lock_timeout;
use cleanwhale_analytics::services::JobLockService;

fn report_request(method: &str, uri: &str, user: &User, body: &str) -> Result<Request<Body>> {
    let token = common::token_for_user(user.id, &user.login, Role::OpsManager, "WARSAW");
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?;
    Ok(req)
}

async fn call(router: &Router, req: Request<Body>) -> Result<(StatusCode, serde_json::Value)> {
    let res = router.clone().oneshot(req).await?;
    let status = res.status();
    Ok((status, common::json_body(res).await))
}

#[tokio::test]
async fn second_report_for_a_week_conflicts() -> Result<()> {
    let Some((router, pool)) = common::database_app().await? else { return Ok(()) };
    let user = common::seed_user(&pool, Role::OpsManager, "WARSAW").await?;
    let body = r#"{"weekIso":"2025-W10","role":"ops","ops":{"orders":12,"messages":40}}"#;

    let (status, created) = call(&router, report_request("POST", "/api/weekly-reports", &user, body)?).await?;
    assert_eq!(status, StatusCode::CREATED, "first submission: {created}");

    let (status, again) = call(&router, report_request("POST", "/api/weekly-reports", &user, body)?).await?;
    assert_eq!(status, StatusCode::CONFLICT, "second submission: {again}");
    assert_eq!(again["success"], false);
    assert!(again.to_string().contains("already exists"), "message: {again}");
    Ok(())
}

#[tokio::test]
async fn updating_a_missing_report_is_not_found() -> Result<()> {
    let Some((router, pool)) = common::database_app().await? else { return Ok(()) };
    let user = common::seed_user(&pool, Role::OpsManager, "WARSAW").await?;
    let body = r#"{"weekIso":"2025-W11","role":"ops","ops":{"orders":1}}"#;

    let (status, missing) =
        call(&router, report_request("PUT", "/api/weekly-reports/2025-W11", &user, body)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND, "update: {missing}");
    assert!(missing.to_string().contains("not found"), "message: {missing}");

    // Once filed, the same update goes through
    let (status, _) = call(&router, report_request("POST", "/api/weekly-reports", &user, body)?).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, updated) =
        call(&router, report_request("PUT", "/api/weekly-reports/2025-W11", &user, body)?).await?;
    assert_eq!(status, StatusCode::OK, "update: {updated}");
    Ok(())
}

#[tokio::test]
async fn held_lock_blocks_a_second_run() -> Result<()> {
    let Some((_, pool)) = common::database_app().await? else { return Ok(()) };
    let locks = JobLockService::new(pool);
    let key = Uuid::new_v4().to_string();

    assert!(locks.acquire("integration-job", &key, default_lock_timeout()).await?);
    assert!(!locks.acquire("integration-job", &key, default_lock_timeout()).await?);

    let skipped = locks
        .with_lock("integration-job", &key, default_lock_timeout(), || async {
            Ok::<_, anyhow::Error>(())
        })
        .await?;
    assert!(skipped.is_none(), "job ran while the lock was held");

    locks.release("integration-job", &key).await?;
    assert!(locks.acquire("integration-job", &key, default_lock_timeout()).await?);
    locks.release("integration-job", &key).await?;
    Ok(())
}

#[tokio::test]
async fn expired_lock_can_be_taken_over() -> Result<()> {
    let Some((_, pool)) = common::database_app().await? else { return Ok(()) };
    let locks = JobLockService::new(pool);
    let key = Uuid::new_v4().to_string();

    assert!(locks.acquire("integration-job", &key, chrono::Duration::milliseconds(-1)).await?);
    assert!(locks.acquire("integration-job", &key, default_lock_timeout()).await?);
    locks.release("integration-job", &key).await?;
    Ok(())
}
