use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Country-manager figures for one city and week.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CountryAggregate {
    pub id: Uuid,
    pub week_iso: String,
    pub city_id: i32,
    pub trengo_responses: i32,
    pub crm_complaints_closed: i32,
    pub hired_people: i32,
    pub city_orders: i32,
    pub trengo_messages: i32,
    #[serde(rename = "hiredHR")]
    pub hired_hr: i32,
    pub hired_ops: i32,
    pub hired_mixed: i32,
    pub notes: Option<String>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
