use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub is_active: bool,
}
