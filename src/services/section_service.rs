use std::sync::Arc;

use crate::database::ExamStore;
use crate::dto::section_dto::{AttemptSummary, QuestionView, SectionPageResponse};
use crate::error::{Error, Result};
use crate::models::attempt::Attempt;
use crate::models::mock::SectionOrder;
use crate::models::session::SessionState;
use crate::services::attempt_service::AttemptService;
use crate::services::gatekeeper::{AttemptContext, Gatekeeper};

#[derive(Debug, Clone)]
pub struct SectionTransition {
    pub attempt: Attempt,
    pub redirect: String,
}

#[derive(Clone)]
pub struct SectionService {
    store: Arc<dyn ExamStore>,
    attempts: AttemptService,
    gatekeeper: Gatekeeper,
}

impl SectionService {
    pub fn new(store: Arc<dyn ExamStore>) -> Self {
        Self {
            attempts: AttemptService::new(store.clone()),
            gatekeeper: Gatekeeper::new(store.clone()),
            store,
        }
    }

    pub async fn page(&self, ctx: &AttemptContext) -> Result<SectionPageResponse> {
        let section = ctx.attempt.current_section;
        let test = self
            .store
            .find_section_test(ctx.mock.id, section)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("{} test for mock {}", section, ctx.mock.slug))
            })?;

        let passages = self.store.list_passages(test.id).await?;
        let groups = self.store.list_groups(test.id).await?;
        let questions = self.store.list_questions(test.id).await?;
        let answers = self.store.list_answers(ctx.attempt.id).await?;

        let answers = answers
            .into_iter()
            .filter(|a| questions.iter().any(|q| q.id == a.question_id))
            .map(|a| (a.question_id, a.response))
            .collect();

        Ok(SectionPageResponse {
            section,
            mock_slug: ctx.mock.slug.clone(),
            attempt: AttemptSummary::from(&ctx.attempt),
            total_seconds: test.duration_seconds,
            test,
            passages,
            groups,
            questions: questions.into_iter().map(QuestionView::from).collect(),
            answers,
        })
    }

    /// Moves the attempt to the section after the current one. Finishing the
    /// last configured section submits the whole attempt.
    pub async fn submit(&self, ctx: &AttemptContext) -> Result<SectionTransition> {
        let sections = self.store.list_sections(ctx.mock.id).await?;
        let order = SectionOrder::from_sections(&sections);

        match order.next_after(ctx.attempt.current_section) {
            Some(next) => {
                let attempt = self.attempts.advance(&ctx.attempt, next).await?;
                Ok(SectionTransition {
                    attempt,
                    redirect: next.page_path(),
                })
            }
            None => {
                let attempt = self.attempts.submit(&ctx.attempt).await?;
                Ok(SectionTransition {
                    attempt,
                    redirect: ctx.mock.detail_path(),
                })
            }
        }
    }

    /// `None` when the session has no attempt to terminate.
    pub async fn terminate(&self, session: &SessionState) -> Result<Option<SectionTransition>> {
        let Some(ctx) = self.gatekeeper.resolve(session).await? else {
            return Ok(None);
        };
        let attempt = self.attempts.terminate(&ctx.attempt).await?;
        Ok(Some(SectionTransition {
            attempt,
            redirect: ctx.mock.detail_path(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::attempt::AttemptStatus;
    use crate::models::mock::{Mock, MockSection};
    use crate::models::section::SectionKind;
    use chrono::Utc;
    use uuid::Uuid;

    fn three_section_mock(store: &MemoryStore) -> Mock {
        let mock = Mock {
            id: Uuid::new_v4(),
            slug: "ielts-3".into(),
            title: "IELTS 3".into(),
            description: String::new(),
            is_active: true,
            is_free: true,
            price_uzs: 0,
            estimated_minutes: 165,
            created_at: Utc::now(),
        };
        store.add_mock(mock.clone()).unwrap();
        let kinds = [SectionKind::Listening, SectionKind::Reading, SectionKind::Writing];
        for (idx, kind) in kinds.into_iter().enumerate() {
            store
                .add_section(MockSection {
                    id: Uuid::new_v4(),
                    mock_id: mock.id,
                    section: kind,
                    position: idx as i16 + 1,
                    duration_seconds: 0,
                })
                .unwrap();
        }
        mock
    }

    #[tokio::test]
    async fn stale_submit_never_moves_the_pointer_back() {
        let store = Arc::new(MemoryStore::new());
        let mock = three_section_mock(&store);
        let mut session = SessionState::empty("candidate");
        AttemptService::new(store.clone())
            .start(&mut session, &mock, None)
            .await
            .unwrap();

        let gate = Gatekeeper::new(store.clone());
        let sections = SectionService::new(store.clone());
        let on_listening = gate.guard(&session, SectionKind::Listening).await.unwrap();

        let to_reading = sections.submit(&on_listening).await.unwrap();
        assert_eq!(to_reading.redirect, "/reading/");
        let on_reading = gate.guard(&session, SectionKind::Reading).await.unwrap();
        sections.submit(&on_reading).await.unwrap();

        let err = sections.submit(&on_listening).await.unwrap_err();
        assert!(matches!(
            err,
            Error::WrongSection {
                current: SectionKind::Writing,
                requested: SectionKind::Listening
            }
        ));
        let stored = store.find_attempt(to_reading.attempt.id).await.unwrap().unwrap();
        assert_eq!(stored.current_section, SectionKind::Writing);
    }

    #[tokio::test]
    async fn stale_submit_after_terminate_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mock = three_section_mock(&store);
        let mut session = SessionState::empty("candidate");
        AttemptService::new(store.clone())
            .start(&mut session, &mock, None)
            .await
            .unwrap();

        let sections = SectionService::new(store.clone());
        let ctx = Gatekeeper::new(store.clone())
            .guard(&session, SectionKind::Listening)
            .await
            .unwrap();
        sections.terminate(&session).await.unwrap();

        let err = sections.submit(&ctx).await.unwrap_err();
        assert!(matches!(err, Error::AttemptNotActive));
        let stored = store.find_attempt(ctx.attempt.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AttemptStatus::Terminated);
        assert_eq!(stored.current_section, SectionKind::Listening);
    }
}
