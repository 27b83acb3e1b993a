// services/aggregate_service.rs - Country-manager figures per city and week
//
// Reads always return every active city so the country view has a full grid;
// cities without a stored row come back as zeros. Writes are a batch upsert on
// (week_iso, city_id) inside one transaction.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::models::CountryAggregate;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::week::IsoWeek;

/// One city in the weekly country grid.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CityAggregate {
    pub city_id: i32,
    pub city_code: String,
    pub city_name: String,
    pub week_iso: String,
    pub trengo_responses: i32,
    pub crm_complaints_closed: i32,
    pub hired_people: i32,
    pub city_orders: i32,
    pub trengo_messages: i32,
    #[serde(rename = "hiredHR")]
    pub hired_hr: i32,
    pub hired_ops: i32,
    pub hired_mixed: i32,
    pub notes: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One element of `items[]` in `POST /api/country-aggregates`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateItem {
    #[serde(deserialize_with = "city_id_from_any")]
    pub city_id: i32,
    #[serde(default)]
    pub trengo_responses: Option<i32>,
    #[serde(default)]
    pub crm_complaints_closed: Option<i32>,
    #[serde(default)]
    pub hired_people: Option<i32>,
    #[serde(default)]
    pub city_orders: Option<i32>,
    #[serde(default)]
    pub trengo_messages: Option<i32>,
    #[serde(default, rename = "hiredHR", alias = "hiredHr")]
    pub hired_hr: Option<i32>,
    #[serde(default)]
    pub hired_ops: Option<i32>,
    #[serde(default)]
    pub hired_mixed: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateBatch {
    pub week_iso: Option<String>,
    pub items: Option<Vec<AggregateItem>>,
}

impl AggregateBatch {
    pub fn validate(self) -> Result<(IsoWeek, Vec<AggregateItem>), ApiError> {
        let week_iso = self
            .week_iso
            .ok_or_else(|| ApiError::field("weekIso", "This field is required"))?;
        let week = IsoWeek::parse(&week_iso)?;
        let items = self
            .items
            .ok_or_else(|| ApiError::field("items", "This field is required"))?;
        Ok((week, items))
    }
}

/// Accepts `3` as well as `"3"`.
fn city_id_from_any<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    let id = match Raw::deserialize(deserializer)? {
        Raw::Number(n) => i32::try_from(n).map_err(de::Error::custom)?,
        Raw::Text(s) => s
            .trim()
            .parse::<i32>()
            .map_err(|_| de::Error::custom(format!("cityId is not a number: {s}")))?,
    };

    if id <= 0 {
        return Err(de::Error::custom("cityId is required"));
    }
    Ok(id)
}

pub struct AggregateService {
    pool: PgPool,
}

impl AggregateService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every active city for `week`, ordered by city code.
    pub async fn for_week(&self, week: IsoWeek) -> Result<Vec<CityAggregate>, DatabaseError> {
        let rows = sqlx::query_as::<_, CityAggregate>(
            "SELECT c.id AS city_id, c.code AS city_code, c.name AS city_name, $1 AS week_iso,
                    COALESCE(a.trengo_responses, 0) AS trengo_responses,
                    COALESCE(a.crm_complaints_closed, 0) AS crm_complaints_closed,
                    COALESCE(a.hired_people, 0) AS hired_people,
                    COALESCE(a.city_orders, 0) AS city_orders,
                    COALESCE(a.trengo_messages, 0) AS trengo_messages,
                    COALESCE(a.hired_hr, 0) AS hired_hr,
                    COALESCE(a.hired_ops, 0) AS hired_ops,
                    COALESCE(a.hired_mixed, 0) AS hired_mixed,
                    COALESCE(a.notes, '') AS notes,
                    a.updated_at
             FROM cities c
             LEFT JOIN country_aggregates a ON a.city_id = c.id AND a.week_iso = $1
             WHERE c.is_active
             ORDER BY c.code ASC",
        )
        .bind(week.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Upsert all items for `week`; missing numbers are stored as zero.
    pub async fn save_batch(
        &self,
        week: IsoWeek,
        items: &[AggregateItem],
        updated_by: Uuid,
    ) -> Result<Vec<CountryAggregate>, DatabaseError> {
        let week_iso = week.to_string();
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(items.len());

        for item in items {
            let row = sqlx::query_as::<_, CountryAggregate>(
                "INSERT INTO country_aggregates (
                    week_iso, city_id, trengo_responses, crm_complaints_closed, hired_people,
                    city_orders, trengo_messages, hired_hr, hired_ops, hired_mixed, notes, updated_by
                 ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NULLIF($11, ''), $12)
                 ON CONFLICT (week_iso, city_id) DO UPDATE SET
                    trengo_responses = EXCLUDED.trengo_responses,
                    crm_complaints_closed = EXCLUDED.crm_complaints_closed,
                    hired_people = EXCLUDED.hired_people,
                    city_orders = EXCLUDED.city_orders,
                    trengo_messages = EXCLUDED.trengo_messages,
                    hired_hr = EXCLUDED.hired_hr,
                    hired_ops = EXCLUDED.hired_ops,
                    hired_mixed = EXCLUDED.hired_mixed,
                    notes = EXCLUDED.notes,
                    updated_by = EXCLUDED.updated_by,
                    updated_at = now()
                 RETURNING id, week_iso, city_id, trengo_responses, crm_complaints_closed, hired_people,
                           city_orders, trengo_messages, hired_hr, hired_ops, hired_mixed, notes,
                           updated_by, created_at, updated_at",
            )
            .bind(&week_iso)
            .bind(item.city_id)
            .bind(item.trengo_responses.unwrap_or(0))
            .bind(item.crm_complaints_closed.unwrap_or(0))
            .bind(item.hired_people.unwrap_or(0))
            .bind(item.city_orders.unwrap_or(0))
            .bind(item.trengo_messages.unwrap_or(0))
            .bind(item.hired_hr.unwrap_or(0))
            .bind(item.hired_ops.unwrap_or(0))
            .bind(item.hired_mixed.unwrap_or(0))
            .bind(item.notes.as_deref().unwrap_or(""))
            .bind(updated_by)
            .fetch_one(&mut *tx)
            .await?;
            saved.push(row);
        }

        tx.commit().await?;
        tracing::info!(week = %week, count = saved.len(), "Country aggregates saved");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn city_id_accepts_numbers_and_strings() {
        let a: AggregateItem = serde_json::from_value(json!({ "cityId": 4 })).unwrap();
        let b: AggregateItem = serde_json::from_value(json!({ "cityId": " 7 ", "hiredHR": 2 })).unwrap();
        assert_eq!(a.city_id, 4);
        assert_eq!(b.city_id, 7);
        assert_eq!(b.hired_hr, Some(2));
        assert_eq!(a.trengo_responses, None);
    }

    #[test]
    fn city_id_must_be_positive_number() {
        assert!(serde_json::from_value::<AggregateItem>(json!({ "cityId": "abc" })).is_err());
        assert!(serde_json::from_value::<AggregateItem>(json!({ "cityId": 0 })).is_err());
        assert!(serde_json::from_value::<AggregateItem>(json!({})).is_err());
    }

    #[test]
    fn batch_requires_week_and_items() {
        let batch: AggregateBatch = serde_json::from_value(json!({ "weekIso": "2025-W02" })).unwrap();
        assert!(batch.validate().is_err());

        let batch: AggregateBatch = serde_json::from_value(json!({ "weekIso": "2025-W99", "items": [] })).unwrap();
        assert!(batch.validate().is_err());

        let batch: AggregateBatch = serde_json::from_value(json!({ "weekIso": "2025-W02", "items": [] })).unwrap();
        let (week, items) = batch.validate().unwrap();
        assert_eq!(week.to_string(), "2025-W02");
        assert!(items.is_empty());
    }
}
