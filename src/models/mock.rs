use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use super::section::SectionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTier {
    Free,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Mock {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub is_free: bool,
    pub price_uzs: i32,
    pub estimated_minutes: i32,
    pub created_at: DateTime<Utc>,
}

impl Mock {
    pub fn access_tier(&self) -> AccessTier {
        if self.is_free {
            AccessTier::Free
        } else {
            AccessTier::Paid
        }
    }

    pub fn detail_path(&self) -> String {
        format!("/mocks/{}/", self.slug)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MockSection {
    pub id: Uuid,
    pub mock_id: Uuid,
    #[sqlx(try_from = "String")]
    pub section: SectionKind,
    pub position: i16,
    pub duration_seconds: i32,
}

impl MockSection {
    pub fn duration_minutes(&self) -> Option<i32> {
        (self.duration_seconds > 0).then_some(self.duration_seconds / 60)
    }
}

/// Content bound to a single section of a mock.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SectionTest {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub duration_seconds: i32,
    pub audio_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Passage {
    pub id: Uuid,
    pub test_id: Uuid,
    pub position: i16,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionGroup {
    pub id: Uuid,
    pub test_id: Uuid,
    pub passage_id: Option<Uuid>,
    pub part: i16,
    pub position: i16,
    pub title: String,
    pub group_type: String,
    pub instructions: String,
    pub data: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MockAccess {
    pub id: Uuid,
    pub subject: String,
    pub mock_id: Uuid,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl MockAccess {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |exp| exp > now)
    }
}

/// Ordered progression through a mock's configured sections.
#[derive(Debug, Clone, Default)]
pub struct SectionOrder(Vec<SectionKind>);

impl SectionOrder {
    pub fn from_sections(sections: &[MockSection]) -> Self {
        let mut sorted: Vec<&MockSection> = sections.iter().collect();
        sorted.sort_by_key(|s| s.position);
        Self(sorted.into_iter().map(|s| s.section).collect())
    }

    pub fn first(&self) -> Option<SectionKind> {
        self.0.first().copied()
    }

    /// `None` means `current` is the last configured section (or is not
    /// configured for this mock at all).
    pub fn next_after(&self, current: SectionKind) -> Option<SectionKind> {
        let idx = self.0.iter().position(|k| *k == current)?;
        self.0.get(idx + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(kind: SectionKind, position: i16) -> MockSection {
        MockSection {
            id: Uuid::new_v4(),
            mock_id: Uuid::nil(),
            section: kind,
            position,
            duration_seconds: 0,
        }
    }

    #[test]
    fn order_follows_position_not_insertion() {
        let order = SectionOrder::from_sections(&[
            section(SectionKind::Writing, 3),
            section(SectionKind::Listening, 1),
            section(SectionKind::Reading, 2),
        ]);
        assert_eq!(order.first(), Some(SectionKind::Listening));
        assert_eq!(order.next_after(SectionKind::Listening), Some(SectionKind::Reading));
        assert_eq!(order.next_after(SectionKind::Reading), Some(SectionKind::Writing));
        assert_eq!(order.next_after(SectionKind::Writing), None);
        assert_eq!(order.next_after(SectionKind::Speaking), None);
    }

    #[test]
    fn grant_expires_at_its_deadline() {
        let now = Utc::now();
        let mut grant = MockAccess {
            id: Uuid::new_v4(),
            subject: "buyer".into(),
            mock_id: Uuid::nil(),
            granted_at: now - chrono::Duration::days(30),
            expires_at: None,
        };
        assert!(grant.is_valid_at(now));

        grant.expires_at = Some(now + chrono::Duration::hours(1));
        assert!(grant.is_valid_at(now));

        grant.expires_at = Some(now);
        assert!(!grant.is_valid_at(now));

        grant.expires_at = Some(now - chrono::Duration::days(1));
        assert!(!grant.is_valid_at(now));
    }

    #[test]
    fn duration_minutes_is_unset_for_zero() {
        let mut s = section(SectionKind::Reading, 1);
        assert_eq!(s.duration_minutes(), None);
        s.duration_seconds = 3600;
        assert_eq!(s.duration_minutes(), Some(60));
    }
}
