use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMeeting {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meeting_name: String,
    pub meeting_date: DateTime<Utc>,
    pub category: String,
    /// User ids of the attendees.
    pub attendees: Json<Vec<String>>,
    pub attendee_names: Json<Vec<String>>,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
