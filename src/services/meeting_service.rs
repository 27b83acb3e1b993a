use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::TeamMeeting;
use crate::database::DatabaseError;
use crate::error::ApiError;

const MEETING_COLUMNS: &str =
    "id, user_id, meeting_name, meeting_date, category, attendees, attendee_names, summary, created_at, updated_at";

/// Body of `POST /api/team-meetings` and `PUT /api/team-meetings/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingInput {
    pub meeting_name: Option<String>,
    pub meeting_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub attendees: Option<Vec<String>>,
    pub attendee_names: Option<Vec<String>>,
    pub summary: Option<String>,
}

/// A complete meeting ready to insert.
#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub meeting_name: String,
    pub meeting_date: DateTime<Utc>,
    pub category: String,
    pub attendees: Vec<String>,
    pub attendee_names: Vec<String>,
    pub summary: String,
}

impl MeetingInput {
    /// Everything except `attendeeNames` is required on create.
    pub fn into_new(self) -> Result<NewMeeting, ApiError> {
        fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::field(field, "This field is required"))
        }

        Ok(NewMeeting {
            meeting_name: required(self.meeting_name, "meetingName")?,
            meeting_date: self
                .meeting_date
                .ok_or_else(|| ApiError::field("meetingDate", "This field is required"))?,
            category: required(self.category, "category")?,
            attendees: self
                .attendees
                .ok_or_else(|| ApiError::field("attendees", "This field is required"))?,
            attendee_names: self.attendee_names.unwrap_or_default(),
            summary: required(self.summary, "summary")?,
        })
    }
}

pub struct MeetingService {
    pool: PgPool,
}

impl MeetingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All meetings, newest first.
    pub async fn list(&self) -> Result<Vec<TeamMeeting>, DatabaseError> {
        let meetings = sqlx::query_as::<_, TeamMeeting>(&format!(
            "SELECT {MEETING_COLUMNS} FROM team_meetings ORDER BY meeting_date DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(meetings)
    }

    pub async fn create(&self, user_id: Uuid, meeting: NewMeeting) -> Result<TeamMeeting, DatabaseError> {
        let meeting = sqlx::query_as::<_, TeamMeeting>(&format!(
            "INSERT INTO team_meetings (user_id, meeting_name, meeting_date, category, attendees, attendee_names, summary)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {MEETING_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&meeting.meeting_name)
        .bind(meeting.meeting_date)
        .bind(&meeting.category)
        .bind(Json(&meeting.attendees))
        .bind(Json(&meeting.attendee_names))
        .bind(&meeting.summary)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(meeting_id = %meeting.id, %user_id, "Team meeting created");
        Ok(meeting)
    }

    /// Partial update; absent fields keep their value.
    pub async fn update(&self, id: Uuid, input: MeetingInput) -> Result<TeamMeeting, DatabaseError> {
        let meeting = sqlx::query_as::<_, TeamMeeting>(&format!(
            "UPDATE team_meetings SET
                meeting_name = COALESCE($2, meeting_name),
                meeting_date = COALESCE($3, meeting_date),
                category = COALESCE($4, category),
                attendees = COALESCE($5, attendees),
                attendee_names = COALESCE($6, attendee_names),
                summary = COALESCE($7, summary),
                updated_at = now()
             WHERE id = $1
             RETURNING {MEETING_COLUMNS}"
        ))
        .bind(id)
        .bind(input.meeting_name)
        .bind(input.meeting_date)
        .bind(input.category)
        .bind(input.attendees.map(Json))
        .bind(input.attendee_names.map(Json))
        .bind(input.summary)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Meeting not found".to_string()))?;

        Ok(meeting)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM team_meetings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Meeting not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attendee_names_are_optional() {
        let input: MeetingInput = serde_json::from_value(json!({
            "meetingName": "Weekly sync",
            "meetingDate": "2025-01-13T10:00:00Z",
            "category": "sync",
            "attendees": ["a", "b"],
            "summary": "Hiring plan"
        }))
        .unwrap();

        let meeting = input.into_new().unwrap();
        assert_eq!(meeting.attendees, vec!["a", "b"]);
        assert!(meeting.attendee_names.is_empty());
    }

    #[test]
    fn missing_fields_name_the_field() {
        let input: MeetingInput = serde_json::from_value(json!({
            "meetingName": "Weekly sync",
            "meetingDate": "2025-01-13T10:00:00Z",
            "category": "  ",
            "attendees": []
        }))
        .unwrap();

        match input.into_new() {
            Err(ApiError::ValidationError { field_errors, .. }) => {
                assert!(field_errors.unwrap().contains_key("category"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
