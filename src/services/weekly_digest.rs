// services/weekly_digest.rs - Weekly summary for the management Telegram chat
//
// Loads the target week plus the three weeks before it, aggregates by city,
// by manager type and per week, collects the free-text remarks and renders one
// Markdown message. Sending runs under a job lock keyed by the week so
// overlapping cron calls do not post twice.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Role;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::services::job_lock::{default_lock_timeout, JobLockService};
use crate::telegram::{TelegramClient, TelegramError};
use crate::week::IsoWeek;

pub const JOB_NAME: &str = "weekly-report";

/// Weeks of history shown next to the target week.
pub const HISTORY_WEEKS: usize = 4;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Telegram(#[from] TelegramError),

    #[error("Weekly report for {0} is already being sent")]
    AlreadyRunning(IsoWeek),
}

impl From<DigestError> for ApiError {
    fn from(err: DigestError) -> Self {
        match err {
            DigestError::AlreadyRunning(_) => ApiError::conflict(err.to_string()),
            other => ApiError::internal_server_error(other.to_string()),
        }
    }
}

/// One report of an active user, joined with its metrics.
#[derive(Debug, Clone, FromRow)]
pub struct DigestRow {
    pub week_iso: String,
    pub user_id: Uuid,
    pub manager_name: String,
    pub role: Role,
    pub city: String,
    pub workdays: i32,
    pub stress_level: i32,
    pub notes: Option<String>,
    pub team_comment: Option<String>,
    pub registrations: Option<i32>,
    pub orders: Option<i32>,
    pub difficult_cases: Option<String>,
    pub diff_cleaners: Option<String>,
    pub diff_clients: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityTotals {
    pub city: String,
    pub employees: i64,
    pub workdays: i64,
    pub registered: i64,
    pub orders: i64,
    pub avg_stress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeTotals {
    #[serde(rename = "type")]
    pub role: Role,
    pub employees: i64,
    pub workdays: i64,
    pub registered: i64,
    pub orders: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekTotals {
    pub week: IsoWeek,
    pub total_employees: i64,
    pub total_workdays: i64,
    pub total_registered: i64,
    pub total_orders: i64,
    pub avg_stress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Remark {
    pub manager: String,
    pub city: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Remarks {
    pub notes: Vec<Remark>,
    pub team_comments: Vec<Remark>,
    pub hr_difficulties: Vec<Remark>,
    pub cleaner_issues: Vec<Remark>,
    pub client_issues: Vec<Remark>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyDigest {
    pub week: IsoWeek,
    pub generated_on: NaiveDate,
    pub active_managers: i64,
    pub reported: i64,
    pub reporting_rate: i64,
    pub by_city: Vec<CityTotals>,
    pub by_type: Vec<TypeTotals>,
    pub history: Vec<WeekTotals>,
    pub remarks: Remarks,
}

/// Response body of the cron endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestOutcome {
    pub week_iso: IsoWeek,
    pub sent_to_telegram: bool,
    pub report_length: usize,
    pub no_data: bool,
}

fn avg_one_decimal(sum: i64, count: i64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (sum as f64 / count as f64 * 10.0).round() / 10.0
}

fn remark(row: &DigestRow, text: Option<&str>) -> Option<Remark> {
    let text = text?.trim();
    (!text.is_empty()).then(|| Remark {
        manager: row.manager_name.clone(),
        city: row.city.clone(),
        text: text.to_string(),
    })
}

impl WeeklyDigest {
    /// Aggregate `rows` (any of the `weeks`) for the first week in `weeks`.
    pub fn build(weeks: &[IsoWeek], rows: &[DigestRow], active_managers: i64, generated_on: NaiveDate) -> Self {
        let week = weeks.first().copied().unwrap_or_else(IsoWeek::current);
        let week_iso = week.to_string();
        let current: Vec<&DigestRow> = rows.iter().filter(|r| r.week_iso == week_iso).collect();

        let mut cities: BTreeMap<&str, (CityTotals, i64)> = BTreeMap::new();
        let mut types: BTreeMap<&str, TypeTotals> = BTreeMap::new();
        let mut remarks = Remarks::default();

        for row in current.iter().copied() {
            let registered = i64::from(row.registrations.unwrap_or(0));
            let orders = i64::from(row.orders.unwrap_or(0));

            let (city, stress_sum) = cities.entry(row.city.as_str()).or_insert_with(|| {
                (
                    CityTotals {
                        city: row.city.clone(),
                        employees: 0,
                        workdays: 0,
                        registered: 0,
                        orders: 0,
                        avg_stress: 0.0,
                    },
                    0,
                )
            });
            city.employees += 1;
            city.workdays += i64::from(row.workdays);
            city.registered += registered;
            city.orders += orders;
            *stress_sum += i64::from(row.stress_level);

            let by_type = types.entry(row.role.as_str()).or_insert_with(|| TypeTotals {
                role: row.role,
                employees: 0,
                workdays: 0,
                registered: 0,
                orders: 0,
            });
            by_type.employees += 1;
            by_type.workdays += i64::from(row.workdays);
            by_type.registered += registered;
            by_type.orders += orders;

            remarks.notes.extend(remark(row, row.notes.as_deref()));
            remarks.team_comments.extend(remark(row, row.team_comment.as_deref()));
            remarks.hr_difficulties.extend(remark(row, row.difficult_cases.as_deref()));
            remarks.cleaner_issues.extend(remark(row, row.diff_cleaners.as_deref()));
            remarks.client_issues.extend(remark(row, row.diff_clients.as_deref()));
        }

        let by_city = cities
            .into_values()
            .map(|(mut totals, stress_sum)| {
                totals.avg_stress = avg_one_decimal(stress_sum, totals.employees);
                totals
            })
            .collect();

        let history = weeks
            .iter()
            .map(|w| {
                let label = w.to_string();
                let in_week: Vec<&DigestRow> = rows.iter().filter(|r| r.week_iso == label).collect();
                let count = in_week.len() as i64;
                WeekTotals {
                    week: *w,
                    total_employees: count,
                    total_workdays: in_week.iter().map(|r| i64::from(r.workdays)).sum(),
                    total_registered: in_week.iter().map(|r| i64::from(r.registrations.unwrap_or(0))).sum(),
                    total_orders: in_week.iter().map(|r| i64::from(r.orders.unwrap_or(0))).sum(),
                    avg_stress: avg_one_decimal(in_week.iter().map(|r| i64::from(r.stress_level)).sum(), count),
                }
            })
            .collect();

        let reported = current.len() as i64;
        let reporting_rate = if active_managers > 0 {
            (reported as f64 / active_managers as f64 * 100.0).round() as i64
        } else {
            0
        };

        Self {
            week,
            generated_on,
            active_managers,
            reported,
            reporting_rate,
            by_city,
            by_type: types.into_values().collect(),
            history,
            remarks,
        }
    }

    pub fn missing_reports(&self) -> i64 {
        (self.active_managers - self.reported).max(0)
    }

    /// Telegram Markdown rendering of the digest.
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        let target = self.history.first();

        let _ = writeln!(out, "📊 *WEEKLY REPORT*");
        let _ = writeln!(out);
        let _ = writeln!(out, "*Week:* {}", self.week.display_label());
        let _ = writeln!(out, "*Generated:* {}", self.generated_on.format("%Y-%m-%d"));
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "⚠️ Reports: {} of {} managers ({}%), {} missing",
            self.reported,
            self.active_managers,
            self.reporting_rate,
            self.missing_reports()
        );

        if let Some(totals) = target {
            let _ = writeln!(out);
            let _ = writeln!(out, "*Key metrics*");
            let _ = writeln!(out, "- Workdays: {}", totals.total_workdays);
            let _ = writeln!(out, "- Registrations: {}", totals.total_registered);
            let _ = writeln!(out, "- Orders: {}", totals.total_orders);
            let _ = writeln!(out, "- Average stress: {:.1}", totals.avg_stress);
        }

        if !self.by_city.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "*By city*");
            for c in &self.by_city {
                let _ = writeln!(
                    out,
                    "- {}: {} managers, {} workdays, {} registered, {} orders, stress {:.1}",
                    c.city, c.employees, c.workdays, c.registered, c.orders, c.avg_stress
                );
            }
        }

        if !self.by_type.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "*By manager type*");
            for t in &self.by_type {
                let _ = writeln!(
                    out,
                    "- {}: {} managers, {} workdays, {} registered, {} orders",
                    escape_markdown(t.role.as_str()),
                    t.employees,
                    t.workdays,
                    t.registered,
                    t.orders
                );
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "*Last {} weeks*", self.history.len());
        for w in &self.history {
            let _ = writeln!(
                out,
                "- {}: {} reports, {} workdays, {} registered, {} orders, stress {:.1}",
                w.week, w.total_employees, w.total_workdays, w.total_registered, w.total_orders, w.avg_stress
            );
        }

        let sections = [
            ("Notes", &self.remarks.notes),
            ("Team", &self.remarks.team_comments),
            ("HR difficulties", &self.remarks.hr_difficulties),
            ("Cleaner issues", &self.remarks.cleaner_issues),
            ("Client issues", &self.remarks.client_issues),
        ];
        for (title, items) in sections {
            if items.is_empty() {
                continue;
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "*{title}*");
            for r in items {
                let _ = writeln!(
                    out,
                    "- {} ({}): {}",
                    escape_markdown(&r.manager),
                    r.city,
                    escape_markdown(&r.text)
                );
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "---");
        let _ = write!(
            out,
            "_CleanWhale Analytics, next report covers {}_",
            self.week.next().display_label()
        );
        out
    }
}

/// Message sent when nobody reported for `week`.
pub fn no_data_message(week: IsoWeek) -> String {
    format!(
        "⚠️ *Report not generated*\n\nNo data for {}\n\nManagers have not filled in their weekly reports yet.\n\n_CleanWhale Analytics_",
        week.display_label()
    )
}

pub fn error_message(error: &str) -> String {
    format!(
        "⚠️ *Weekly report failed*\n\n{}\n\n_CleanWhale Analytics cron job_",
        escape_markdown(error)
    )
}

/// Escape the characters legacy Telegram Markdown treats as markup.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub struct DigestService {
    pool: PgPool,
}

impl DigestService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reports of active users for `weeks`, newest week first.
    pub async fn load_rows(&self, weeks: &[IsoWeek]) -> Result<Vec<DigestRow>, DatabaseError> {
        let labels: Vec<String> = weeks.iter().map(ToString::to_string).collect();

        let rows = sqlx::query_as::<_, DigestRow>(
            "SELECT r.week_iso, r.user_id, u.name AS manager_name, u.role, u.city,
                    r.workdays, r.stress_level, r.notes, r.team_comment,
                    h.registrations, o.orders, h.difficult_cases, o.diff_cleaners, o.diff_clients
             FROM weekly_reports r
             JOIN users u ON u.id = r.user_id
             LEFT JOIN hr_metrics h ON h.report_id = r.id
             LEFT JOIN ops_metrics o ON o.report_id = r.id
             WHERE u.is_active AND r.week_iso = ANY($1)
             ORDER BY r.week_iso DESC, u.city ASC, u.name ASC",
        )
        .bind(&labels)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Active users in the roles that file weekly reports.
    pub async fn active_managers(&self) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users
             WHERE is_active AND role IN ('HIRING_MANAGER', 'OPS_MANAGER', 'MIXED_MANAGER')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Build the digest for `week` and post it.
    pub async fn send(&self, telegram: &TelegramClient, week: IsoWeek) -> Result<DigestOutcome, DigestError> {
        let weeks = week.trailing(HISTORY_WEEKS);
        let rows = self.load_rows(&weeks).await?;
        tracing::info!(week = %week, reports = rows.len(), "Loaded reports for weekly digest");

        if rows.is_empty() {
            let message = no_data_message(week);
            telegram.send_message(&message).await?;
            return Ok(DigestOutcome {
                week_iso: week,
                sent_to_telegram: true,
                report_length: message.chars().count(),
                no_data: true,
            });
        }

        let active = self.active_managers().await?;
        let digest = WeeklyDigest::build(&weeks, &rows, active, Utc::now().date_naive());
        let report = digest.render_markdown();
        telegram.send_message(&report).await?;

        tracing::info!(week = %week, reported = digest.reported, length = report.len(), "Weekly digest sent");
        Ok(DigestOutcome {
            week_iso: week,
            sent_to_telegram: true,
            report_length: report.chars().count(),
            no_data: false,
        })
    }

    /// `send` under the weekly job lock; failures are reported to the chat.
    pub async fn run(&self, telegram: &TelegramClient, week: IsoWeek) -> Result<DigestOutcome, DigestError> {
        let locks = JobLockService::new(self.pool.clone());
        if let Err(e) = locks.cleanup_expired().await {
            tracing::warn!(error = %e, "Failed to remove expired job locks");
        }
        let outcome = locks
            .with_lock(JOB_NAME, &week.to_string(), default_lock_timeout(), || self.send(telegram, week))
            .await;

        match outcome {
            Ok(Some(outcome)) => Ok(outcome),
            Ok(None) => Err(DigestError::AlreadyRunning(week)),
            Err(e) => {
                tracing::error!(week = %week, error = %e, "Weekly digest failed");
                if telegram.is_configured() && !matches!(e, DigestError::Telegram(_)) {
                    if let Err(notify) = telegram.send_message(&error_message(&e.to_string())).await {
                        tracing::error!(error = %notify, "Failed to send error notice");
                    }
                }
                Err(e)
            }
        }
    }
}
