use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::mock::{AccessTier, Mock};
use crate::models::section::SectionKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub access_tier: AccessTier,
    pub price_uzs: i32,
    pub estimated_minutes: i32,
}

impl From<&Mock> for MockSummary {
    fn from(m: &Mock) -> Self {
        Self {
            id: m.id,
            slug: m.slug.clone(),
            title: m.title.clone(),
            description: m.description.clone(),
            access_tier: m.access_tier(),
            price_uzs: m.price_uzs,
            estimated_minutes: m.estimated_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockListResponse {
    pub items: Vec<MockSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSummary {
    pub id: Uuid,
    pub section: SectionKind,
    pub position: i16,
    pub duration_minutes: Option<i32>,
    pub questions_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockDetailResponse {
    pub mock: MockSummary,
    pub sections: Vec<SectionSummary>,
    pub has_access: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartQuery {
    pub section: Option<Uuid>,
}
