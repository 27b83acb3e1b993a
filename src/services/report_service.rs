// services/report_service.rs - Weekly self-reports and their HR / ops metrics
//
// A report row holds the fields every manager fills in; HR and ops metrics live
// in their own tables keyed by (user_id, week_iso) and point back to the report.
// Report and metrics are always written in one transaction.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::{HrMetrics, OpsMetrics, WeeklyReport};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::week::IsoWeek;

const REPORT_COLUMNS: &str = "id, user_id, week_iso, week_start_date, week_end_date, workdays, \
     stress_level, overtime, overtime_hours, next_week_schedule, good_work_with, bad_work_with, \
     team_comment, notes, is_completed, submitted_at, created_at, updated_at";

const HR_COLUMNS: &str = "id, user_id, report_id, week_iso, interviews, job_posts, registrations, \
     full_days, difficult_cases, stress, overtime, created_at, updated_at";

const OPS_COLUMNS: &str = "id, user_id, report_id, week_iso, messages, orders, full_days, \
     diff_cleaners, diff_clients, stress, overtime, created_at, updated_at";

/// Which metric block a submission or view is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Hr,
    Ops,
    Mixed,
}

impl MetricKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hr" => Some(MetricKind::Hr),
            "ops" => Some(MetricKind::Ops),
            "mixed" => Some(MetricKind::Mixed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Hr => "hr",
            MetricKind::Ops => "ops",
            MetricKind::Mixed => "mixed",
        }
    }

    /// Whether `role` may read or write this kind of metrics.
    pub fn allowed_for(&self, role: Role) -> bool {
        match self {
            MetricKind::Hr => role.has_hr_metrics(),
            MetricKind::Ops => role.has_ops_metrics(),
            MetricKind::Mixed => role == Role::MixedManager,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseInput {
    pub workdays: Option<i32>,
    pub stress_level: Option<i32>,
    pub overtime: Option<bool>,
    pub overtime_hours: Option<i32>,
    pub next_week_schedule: Option<serde_json::Value>,
    pub good_work_with: Option<String>,
    pub bad_work_with: Option<String>,
    pub team_comment: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HrInput {
    pub interviews: Option<i32>,
    pub job_posts: Option<i32>,
    #[serde(alias = "registered")]
    pub registrations: Option<i32>,
    pub full_days: Option<i32>,
    #[serde(alias = "difficult")]
    pub difficult_cases: Option<String>,
    pub stress: Option<i32>,
    pub overtime: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpsInput {
    pub messages: Option<i32>,
    pub orders: Option<i32>,
    pub diff_cleaners: Option<String>,
    pub diff_clients: Option<String>,
    pub stress: Option<i32>,
    pub overtime: Option<bool>,
}

/// Body of `POST /api/weekly-reports` and `PUT /api/weekly-reports/:week`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSubmission {
    pub week_iso: Option<String>,
    pub role: Option<MetricKind>,
    #[serde(default)]
    pub base: Option<BaseInput>,
    #[serde(default)]
    pub hr: Option<HrInput>,
    #[serde(default)]
    pub ops: Option<OpsInput>,
}

impl ReportSubmission {
    /// Check the submission is complete and allowed for `role`; returns the
    /// metric kind it carries.
    pub fn validate(&self, role: Role) -> Result<MetricKind, ApiError> {
        let kind = self.role.ok_or_else(|| ApiError::field("role", "This field is required"))?;

        match kind {
            MetricKind::Hr if self.hr.is_none() => return Err(ApiError::field("hr", "Required for role hr")),
            MetricKind::Ops if self.ops.is_none() => return Err(ApiError::field("ops", "Required for role ops")),
            MetricKind::Mixed if self.hr.is_none() && self.ops.is_none() => {
                return Err(ApiError::field("hr", "Role mixed requires hr or ops data"))
            }
            _ => {}
        }

        if !kind.allowed_for(role) {
            return Err(ApiError::forbidden(format!("No access to {} metrics", kind.as_str())));
        }

        if let Some(base) = &self.base {
            if base.stress_level.is_some_and(|s| !(0..=10).contains(&s)) {
                return Err(ApiError::field("base.stressLevel", "Must be between 0 and 10"));
            }
            if base.workdays.is_some_and(|d| !(0..=7).contains(&d)) {
                return Err(ApiError::field("base.workdays", "Must be between 0 and 7"));
            }
        }

        Ok(kind)
    }
}

/// A report together with whichever metric rows exist for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBundle {
    pub report: WeeklyReport,
    pub hr_metrics: Option<HrMetrics>,
    pub ops_metrics: Option<OpsMetrics>,
}

pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, user_id: Uuid, week: IsoWeek) -> Result<Option<ReportBundle>, DatabaseError> {
        let week_iso = week.to_string();

        let report = sqlx::query_as::<_, WeeklyReport>(&format!(
            "SELECT {REPORT_COLUMNS} FROM weekly_reports WHERE user_id = $1 AND week_iso = $2"
        ))
        .bind(user_id)
        .bind(&week_iso)
        .fetch_optional(&self.pool)
        .await?;

        let Some(report) = report else {
            return Ok(None);
        };

        let hr_metrics = sqlx::query_as::<_, HrMetrics>(&format!(
            "SELECT {HR_COLUMNS} FROM hr_metrics WHERE user_id = $1 AND week_iso = $2"
        ))
        .bind(user_id)
        .bind(&week_iso)
        .fetch_optional(&self.pool)
        .await?;

        let ops_metrics = sqlx::query_as::<_, OpsMetrics>(&format!(
            "SELECT {OPS_COLUMNS} FROM ops_metrics WHERE user_id = $1 AND week_iso = $2"
        ))
        .bind(user_id)
        .bind(&week_iso)
        .fetch_optional(&self.pool)
        .await?;

        Ok(Some(ReportBundle {
            report,
            hr_metrics,
            ops_metrics,
        }))
    }

    /// Create the caller's report for `week`. A second report for the same
    /// week is a unique violation.
    pub async fn create(
        &self,
        user_id: Uuid,
        week: IsoWeek,
        kind: MetricKind,
        submission: &ReportSubmission,
    ) -> Result<ReportBundle, DatabaseError> {
        let base = submission.base.clone().unwrap_or_default();
        let (start, end) = week.range();

        let mut tx = self.pool.begin().await?;

        let report = sqlx::query_as::<_, WeeklyReport>(&format!(
            "INSERT INTO weekly_reports (
                user_id, week_iso, week_start_date, week_end_date, workdays, stress_level,
                overtime, overtime_hours, next_week_schedule, good_work_with, bad_work_with,
                team_comment, notes, is_completed, submitted_at
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, TRUE, now())
             RETURNING {REPORT_COLUMNS}"
        ))
        .bind(user_id)
        .bind(week.to_string())
        .bind(start)
        .bind(end)
        .bind(base.workdays.unwrap_or(0))
        .bind(base.stress_level.unwrap_or(0))
        .bind(base.overtime.unwrap_or(false))
        .bind(base.overtime_hours.unwrap_or(0))
        .bind(base.next_week_schedule)
        .bind(non_blank(base.good_work_with))
        .bind(non_blank(base.bad_work_with))
        .bind(non_blank(base.team_comment))
        .bind(non_blank(base.notes))
        .fetch_one(&mut *tx)
        .await?;

        let bundle = Self::write_metrics(&mut tx, report, kind, submission).await?;
        tx.commit().await?;

        tracing::info!(%user_id, week = %week, "Weekly report created");
        Ok(bundle)
    }

    /// Update the caller's existing report for `week` and upsert its metrics.
    pub async fn update(
        &self,
        user_id: Uuid,
        week: IsoWeek,
        kind: MetricKind,
        submission: &ReportSubmission,
    ) -> Result<ReportBundle, DatabaseError> {
        let base = submission.base.clone().unwrap_or_default();
        let mut tx = self.pool.begin().await?;

        // Text fields: absent keeps the stored value, blank clears it
        let report = sqlx::query_as::<_, WeeklyReport>(&format!(
            "UPDATE weekly_reports SET
                workdays = COALESCE($3, workdays),
                stress_level = COALESCE($4, stress_level),
                overtime = COALESCE($5, overtime),
                overtime_hours = COALESCE($6, overtime_hours),
                next_week_schedule = COALESCE($7, next_week_schedule),
                good_work_with = CASE WHEN $8::text IS NULL THEN good_work_with ELSE NULLIF($8, '') END,
                bad_work_with = CASE WHEN $9::text IS NULL THEN bad_work_with ELSE NULLIF($9, '') END,
                team_comment = CASE WHEN $10::text IS NULL THEN team_comment ELSE NULLIF($10, '') END,
                notes = CASE WHEN $11::text IS NULL THEN notes ELSE NULLIF($11, '') END,
                is_completed = TRUE,
                submitted_at = COALESCE(submitted_at, now()),
                updated_at = now()
             WHERE user_id = $1 AND week_iso = $2
             RETURNING {REPORT_COLUMNS}"
        ))
        .bind(user_id)
        .bind(week.to_string())
        .bind(base.workdays)
        .bind(base.stress_level)
        .bind(base.overtime)
        .bind(base.overtime_hours)
        .bind(base.next_week_schedule)
        .bind(base.good_work_with)
        .bind(base.bad_work_with)
        .bind(base.team_comment)
        .bind(base.notes)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("No report for week {week}")))?;

        let bundle = Self::write_metrics(&mut tx, report, kind, submission).await?;
        tx.commit().await?;

        tracing::info!(%user_id, week = %week, "Weekly report updated");
        Ok(bundle)
    }

    async fn write_metrics(
        tx: &mut Transaction<'_, Postgres>,
        report: WeeklyReport,
        kind: MetricKind,
        submission: &ReportSubmission,
    ) -> Result<ReportBundle, DatabaseError> {
        let mut hr_metrics = None;
        let mut ops_metrics = None;

        if matches!(kind, MetricKind::Hr | MetricKind::Mixed) {
            if let Some(hr) = &submission.hr {
                hr_metrics = Some(Self::upsert_hr(tx, &report, hr).await?);
            }
        }

        if matches!(kind, MetricKind::Ops | MetricKind::Mixed) {
            if let Some(ops) = &submission.ops {
                ops_metrics = Some(Self::upsert_ops(tx, &report, ops).await?);
            }
        }

        Ok(ReportBundle {
            report,
            hr_metrics,
            ops_metrics,
        })
    }

    async fn upsert_hr(
        tx: &mut Transaction<'_, Postgres>,
        report: &WeeklyReport,
        hr: &HrInput,
    ) -> Result<HrMetrics, DatabaseError> {
        let metrics = sqlx::query_as::<_, HrMetrics>(&format!(
            "INSERT INTO hr_metrics (
                user_id, report_id, week_iso, interviews, job_posts, registrations,
                full_days, difficult_cases, stress, overtime
             ) VALUES ($1, $2, $3, COALESCE($4, 0), COALESCE($5, 0), COALESCE($6, 0),
                       COALESCE($7, 0), NULLIF($8, ''), $9, COALESCE($10, FALSE))
             ON CONFLICT (user_id, week_iso) DO UPDATE SET
                report_id = EXCLUDED.report_id,
                interviews = COALESCE($4, hr_metrics.interviews),
                job_posts = COALESCE($5, hr_metrics.job_posts),
                registrations = COALESCE($6, hr_metrics.registrations),
                full_days = COALESCE($7, hr_metrics.full_days),
                difficult_cases = CASE WHEN $8::text IS NULL THEN hr_metrics.difficult_cases
                                       ELSE NULLIF($8, '') END,
                stress = COALESCE($9, hr_metrics.stress),
                overtime = COALESCE($10, hr_metrics.overtime),
                updated_at = now()
             RETURNING {HR_COLUMNS}"
        ))
        .bind(report.user_id)
        .bind(report.id)
        .bind(&report.week_iso)
        .bind(hr.interviews)
        .bind(hr.job_posts)
        .bind(hr.registrations)
        .bind(hr.full_days)
        .bind(&hr.difficult_cases)
        .bind(hr.stress)
        .bind(hr.overtime)
        .fetch_one(&mut **tx)
        .await?;
        Ok(metrics)
    }

    async fn upsert_ops(
        tx: &mut Transaction<'_, Postgres>,
        report: &WeeklyReport,
        ops: &OpsInput,
    ) -> Result<OpsMetrics, DatabaseError> {
        // full_days mirrors the report's workdays
        let metrics = sqlx::query_as::<_, OpsMetrics>(&format!(
            "INSERT INTO ops_metrics (
                user_id, report_id, week_iso, messages, orders, full_days,
                diff_cleaners, diff_clients, stress, overtime
             ) VALUES ($1, $2, $3, COALESCE($4, 0), COALESCE($5, 0), $6,
                       NULLIF($7, ''), NULLIF($8, ''), $9, COALESCE($10, FALSE))
             ON CONFLICT (user_id, week_iso) DO UPDATE SET
                report_id = EXCLUDED.report_id,
                messages = COALESCE($4, ops_metrics.messages),
                orders = COALESCE($5, ops_metrics.orders),
                full_days = $6,
                diff_cleaners = CASE WHEN $7::text IS NULL THEN ops_metrics.diff_cleaners
                                     ELSE NULLIF($7, '') END,
                diff_clients = CASE WHEN $8::text IS NULL THEN ops_metrics.diff_clients
                                    ELSE NULLIF($8, '') END,
                stress = COALESCE($9, ops_metrics.stress),
                overtime = COALESCE($10, ops_metrics.overtime),
                updated_at = now()
             RETURNING {OPS_COLUMNS}"
        ))
        .bind(report.user_id)
        .bind(report.id)
        .bind(&report.week_iso)
        .bind(ops.messages)
        .bind(ops.orders)
        .bind(report.workdays)
        .bind(&ops.diff_cleaners)
        .bind(&ops.diff_clients)
        .bind(ops.stress)
        .bind(ops.overtime)
        .fetch_one(&mut **tx)
        .await?;
        Ok(metrics)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(value: serde_json::Value) -> ReportSubmission {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_legacy_hr_field_names() {
        let s = submission(json!({
            "weekIso": "2025-W03",
            "role": "hr",
            "hr": { "interviews": 4, "registered": 2, "difficult": "no-show" }
        }));
        let hr = s.hr.unwrap();
        assert_eq!(hr.registrations, Some(2));
        assert_eq!(hr.difficult_cases.as_deref(), Some("no-show"));
    }

    #[test]
    fn role_specific_block_is_required() {
        let s = submission(json!({ "weekIso": "2025-W03", "role": "ops" }));
        assert!(matches!(s.validate(Role::OpsManager), Err(ApiError::ValidationError { .. })));

        let s = submission(json!({ "weekIso": "2025-W03" }));
        assert!(s.validate(Role::OpsManager).is_err());
    }

    #[test]
    fn metric_access_is_checked() {
        let s = submission(json!({ "weekIso": "2025-W03", "role": "hr", "hr": {} }));
        assert!(matches!(s.validate(Role::OpsManager), Err(ApiError::Forbidden(_))));
        assert_eq!(s.validate(Role::HiringManager).unwrap(), MetricKind::Hr);
        assert_eq!(s.validate(Role::MixedManager).unwrap(), MetricKind::Hr);
    }

    #[test]
    fn mixed_needs_one_block() {
        let s = submission(json!({ "role": "mixed", "ops": { "orders": 3 } }));
        assert_eq!(s.validate(Role::MixedManager).unwrap(), MetricKind::Mixed);
        assert!(s.validate(Role::OpsManager).is_err());
    }

    #[test]
    fn stress_level_is_bounded() {
        let s = submission(json!({ "role": "ops", "ops": {}, "base": { "stressLevel": 11 } }));
        assert!(s.validate(Role::OpsManager).is_err());
    }

    #[test]
    fn blank_text_is_dropped() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some("ok".into())).as_deref(), Some("ok"));
    }
}
