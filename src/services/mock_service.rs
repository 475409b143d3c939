use std::sync::Arc;
use uuid::Uuid;

use crate::database::ExamStore;
use crate::dto::mock_dto::{MockDetailResponse, MockSummary, SectionSummary};
use crate::error::{Error, Result};
use crate::models::attempt::Attempt;
use crate::models::mock::Mock;
use crate::services::attempt_service::AttemptService;
use crate::utils::time::now;

#[derive(Debug, Clone)]
pub enum StartOutcome {
    Started(Attempt),
    AccessDenied(Mock),
}

#[derive(Clone)]
pub struct MockService {
    store: Arc<dyn ExamStore>,
    attempts: AttemptService,
}

impl MockService {
    pub fn new(store: Arc<dyn ExamStore>) -> Self {
        Self {
            attempts: AttemptService::new(store.clone()),
            store,
        }
    }

    pub async fn list(&self) -> Result<Vec<Mock>> {
        self.store.list_active_mocks().await
    }

    async fn active_mock(&self, slug: &str) -> Result<Mock> {
        match self.store.find_mock_by_slug(slug).await? {
            Some(mock) if mock.is_active => Ok(mock),
            _ => Err(Error::NotFound(format!("mock '{}'", slug))),
        }
    }

    pub async fn has_access(&self, subject: Option<&str>, mock: &Mock) -> Result<bool> {
        if mock.is_free {
            return Ok(true);
        }
        let Some(subject) = subject else {
            return Ok(false);
        };
        let grant = self.store.find_access(subject, mock.id).await?;
        Ok(grant.is_some_and(|g| g.is_valid_at(now())))
    }

    pub async fn detail(&self, slug: &str, subject: Option<&str>) -> Result<MockDetailResponse> {
        let mock = self.active_mock(slug).await?;
        let has_access = self.has_access(subject, &mock).await?;

        let mut sections = Vec::new();
        for section in self.store.list_sections(mock.id).await? {
            let test = self.store.find_section_test(mock.id, section.section).await?;
            let questions_count = match test {
                Some(test) => Some(self.store.count_questions(test.id).await?),
                None => None,
            };
            sections.push(SectionSummary {
                id: section.id,
                section: section.section,
                position: section.position,
                duration_minutes: section.duration_minutes(),
                questions_count,
            });
        }

        Ok(MockDetailResponse {
            mock: MockSummary::from(&mock),
            sections,
            has_access,
        })
    }

    pub async fn start(
        &self,
        subject: &str,
        slug: &str,
        section_id: Option<Uuid>,
    ) -> Result<StartOutcome> {
        let mock = self.active_mock(slug).await?;
        if !self.has_access(Some(subject), &mock).await? {
            tracing::warn!(%subject, mock = %mock.slug, "Start refused, no access to mock");
            return Ok(StartOutcome::AccessDenied(mock));
        }

        let starting = match section_id {
            Some(id) => {
                let sections = self.store.list_sections(mock.id).await?;
                let section = sections
                    .into_iter()
                    .find(|s| s.id == id)
                    .ok_or_else(|| Error::NotFound(format!("section {} of mock '{}'", id, slug)))?;
                Some(section.section)
            }
            None => None,
        };

        let mut session = self.store.load_session(subject).await?;
        let attempt = self.attempts.start(&mut session, &mock, starting).await?;
        Ok(StartOutcome::Started(attempt))
    }
}
