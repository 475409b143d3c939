use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-subject pointer to the attempt the candidate is currently taking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SessionState {
    pub subject: String,
    pub active_attempt_id: Option<Uuid>,
    pub active_mock_slug: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn empty(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }
}
