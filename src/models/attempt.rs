use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::section::SectionKind;
use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Submitted,
    Terminated,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Submitted => "submitted",
            AttemptStatus::Terminated => "terminated",
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttemptStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(AttemptStatus::InProgress),
            "submitted" => Ok(AttemptStatus::Submitted),
            "terminated" => Ok(AttemptStatus::Terminated),
            other => Err(UnknownVariant::new("attempt status", other)),
        }
    }
}

impl TryFrom<String> for AttemptStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One candidate's run through a mock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Attempt {
    pub id: Uuid,
    pub mock_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: AttemptStatus,
    #[sqlx(try_from = "String")]
    pub current_section: SectionKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Attempt {
    pub fn new(mock_id: Uuid, current_section: SectionKind, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mock_id,
            status: AttemptStatus::InProgress,
            current_section,
            started_at: now,
            finished_at: None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == AttemptStatus::InProgress
    }

    pub fn advance(&mut self, next: SectionKind) {
        self.current_section = next;
    }

    /// Returns false when the attempt had already left `in_progress`, in
    /// which case nothing changes.
    pub fn terminate(&mut self, now: DateTime<Utc>) -> bool {
        self.finish(AttemptStatus::Terminated, now)
    }

    pub fn submit(&mut self, now: DateTime<Utc>) -> bool {
        self.finish(AttemptStatus::Submitted, now)
    }

    fn finish(&mut self, status: AttemptStatus, now: DateTime<Utc>) -> bool {
        if !self.is_in_progress() {
            return false;
        }
        self.status = status;
        self.finished_at = Some(now);
        true
    }
}
