use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_iso: String,
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    pub workdays: i32,
    pub stress_level: i32,
    pub overtime: bool,
    pub overtime_hours: i32,
    pub next_week_schedule: Option<serde_json::Value>,
    pub good_work_with: Option<String>,
    pub bad_work_with: Option<String>,
    pub team_comment: Option<String>,
    pub notes: Option<String>,
    pub is_completed: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HrMetrics {
    pub id: Uuid,
    pub user_id: Uuid,
    pub report_id: Uuid,
    pub week_iso: String,
    pub interviews: i32,
    pub job_posts: i32,
    pub registrations: i32,
    pub full_days: i32,
    pub difficult_cases: Option<String>,
    pub stress: Option<i32>,
    pub overtime: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OpsMetrics {
    pub id: Uuid,
    pub user_id: Uuid,
    pub report_id: Uuid,
    pub week_iso: String,
    pub messages: i32,
    pub orders: i32,
    pub full_days: i32,
    pub diff_cleaners: Option<String>,
    pub diff_clients: Option<String>,
    pub stress: Option<i32>,
    pub overtime: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
