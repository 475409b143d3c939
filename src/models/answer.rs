use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored candidate response. Serializes to `{text}`, `{values}` or `{value}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Text { text: String },
    Values { values: Vec<String> },
    Value { value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AttemptAnswer {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    #[sqlx(json)]
    pub response: Response,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
