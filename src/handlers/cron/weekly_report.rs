// handlers/cron/weekly_report.rs - GET /api/cron/weekly-report[?week=]

use axum::{
    extract::{Query, State},
    http::HeaderMap,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::secret_matches;
use crate::error::ApiError;
use crate::middleware::auth::bearer_token;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::weekly_digest::DigestOutcome;
use crate::services::DigestService;
use crate::week::IsoWeek;

#[derive(Debug, Deserialize)]
pub struct CronQuery {
    pub week: Option<String>,
}

pub fn authorize(expected: Option<&str>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = expected.filter(|s| !s.is_empty()) else {
        tracing::error!("Cron request rejected: CRON_SECRET is not configured");
        return Err(ApiError::unauthorized("Unauthorized"));
    };

    match bearer_token(headers) {
        Some(given) if secret_matches(expected, given) => Ok(()),
        given => {
            tracing::warn!(has_auth = given.is_some(), "Unauthorized cron request");
            Err(ApiError::unauthorized("Unauthorized"))
        }
    }
}

/// GET /api/cron/weekly-report - build and post the weekly digest
///
/// Targets the week before the current one unless `?week=` is given.
pub async fn weekly_report_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CronQuery>,
) -> ApiResult<DigestOutcome> {
    authorize(state.config.security.cron_secret.as_deref(), &headers)?;

    let week = match query.week.as_deref().filter(|w| !w.is_empty()) {
        Some(w) => IsoWeek::parse(w)?,
        None => IsoWeek::current().previous(),
    };

    if !state.telegram.is_configured() {
        tracing::error!("Weekly report skipped: Telegram is not configured");
        return Err(ApiError::internal_server_error("Telegram not configured"));
    }

    tracing::info!(week = %week, "Weekly report job started");
    let outcome = DigestService::new(state.pool.clone()).run(&state.telegram, week).await?;

    let message = if outcome.no_data {
        "No data available, notification sent"
    } else {
        "Weekly report generated and sent"
    };
    Ok(ApiResponse::success(outcome).message(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap());
        headers
    }

    #[test]
    fn accepts_matching_secret() {
        assert!(authorize(Some("s3cret"), &bearer("s3cret")).is_ok());
    }

    #[test]
    fn rejects_wrong_or_missing_secret() {
        assert!(authorize(Some("s3cret"), &bearer("nope")).is_err());
        assert!(authorize(Some("s3cret"), &HeaderMap::new()).is_err());
        assert!(authorize(None, &bearer("anything")).is_err());
        assert!(authorize(Some(""), &bearer("")).is_err());
    }

    #[test]
    fn vercel_header_alone_is_not_enough() {
        let mut headers = HeaderMap::new();
        headers.insert("x-vercel-cron", HeaderValue::from_static("1"));
        assert!(authorize(Some("s3cret"), &headers).is_err());
    }
}
