use std::sync::Arc;

use crate::database::ExamStore;
use crate::error::{Error, Result};
use crate::models::attempt::{Attempt, AttemptStatus};
use crate::models::mock::{Mock, SectionOrder};
use crate::models::section::SectionKind;
use crate::models::session::SessionState;
use crate::utils::time::now;

#[derive(Clone)]
pub struct AttemptService {
    store: Arc<dyn ExamStore>,
}

impl AttemptService {
    pub fn new(store: Arc<dyn ExamStore>) -> Self {
        Self { store }
    }

    /// Starts a fresh attempt for `mock` and points the session at it. The
    /// attempt the session pointed at before is terminated first.
    pub async fn start(
        &self,
        session: &mut SessionState,
        mock: &Mock,
        starting_section: Option<SectionKind>,
    ) -> Result<Attempt> {
        let ts = now();
        if let Some(previous) = session.active_attempt_id {
            if let Some(prev) = self.store.terminate_attempt(previous, ts).await? {
                tracing::info!(
                    attempt_id = %prev.id,
                    status = %prev.status,
                    "Closed previous attempt before starting a new one"
                );
            }
        }

        let starting = match starting_section {
            Some(kind) => kind,
            None => {
                let sections = self.store.list_sections(mock.id).await?;
                SectionOrder::from_sections(&sections).first().unwrap_or_default()
            }
        };

        let attempt = Attempt::new(mock.id, starting, ts);
        self.store.insert_attempt(&attempt).await?;

        session.active_attempt_id = Some(attempt.id);
        session.active_mock_slug = Some(mock.slug.clone());
        self.store.save_session(session).await?;

        tracing::info!(
            attempt_id = %attempt.id,
            mock = %mock.slug,
            section = %attempt.current_section,
            subject = %session.subject,
            "Attempt started"
        );
        Ok(attempt)
    }

    pub async fn advance(&self, attempt: &Attempt, next: SectionKind) -> Result<Attempt> {
        let from = attempt.current_section;
        match self.store.advance_section(attempt.id, from, next).await? {
            Some(updated) => {
                tracing::info!(attempt_id = %updated.id, %from, to = %next, "Attempt advanced");
                Ok(updated)
            }
            None => Err(self.stale(attempt).await?),
        }
    }

    /// No-op for attempts that are already submitted or terminated.
    pub async fn terminate(&self, attempt: &Attempt) -> Result<Attempt> {
        let updated = self
            .store
            .terminate_attempt(attempt.id, now())
            .await?
            .ok_or_else(|| Error::NotFound(format!("attempt {}", attempt.id)))?;
        if attempt.is_in_progress() {
            tracing::info!(attempt_id = %updated.id, "Attempt terminated");
        }
        Ok(updated)
    }

    pub async fn submit(&self, attempt: &Attempt) -> Result<Attempt> {
        let updated = self
            .store
            .submit_attempt(attempt.id, now())
            .await?
            .ok_or_else(|| Error::NotFound(format!("attempt {}", attempt.id)))?;
        if updated.status != AttemptStatus::Submitted {
            tracing::warn!(
                attempt_id = %updated.id,
                status = %updated.status,
                "Submit after finish"
            );
            return Err(Error::AttemptNotActive);
        }
        tracing::info!(attempt_id = %updated.id, "Attempt submitted");
        Ok(updated)
    }

    // The stored attempt moved on since `attempt` was read.
    async fn stale(&self, attempt: &Attempt) -> Result<Error> {
        let current = self
            .store
            .find_attempt(attempt.id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("attempt {}", attempt.id)))?;
        tracing::warn!(
            attempt_id = %current.id,
            expected = %attempt.current_section,
            current = %current.current_section,
            status = %current.status,
            "Stale section transition"
        );
        if !current.is_in_progress() {
            return Ok(Error::AttemptNotActive);
        }
        Ok(Error::WrongSection {
            current: current.current_section,
            requested: attempt.current_section,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::mock::MockSection;
    use chrono::Utc;
    use uuid::Uuid;

    fn mock(store: &MemoryStore, kinds: &[SectionKind]) -> Mock {
        let mock = Mock {
            id: Uuid::new_v4(),
            slug: "ielts-1".into(),
            title: "IELTS 1".into(),
            description: String::new(),
            is_active: true,
            is_free: true,
            price_uzs: 0,
            estimated_minutes: 165,
            created_at: Utc::now(),
        };
        store.add_mock(mock.clone()).unwrap();
        for (idx, kind) in kinds.iter().enumerate() {
            store
                .add_section(MockSection {
                    id: Uuid::new_v4(),
                    mock_id: mock.id,
                    section: *kind,
                    position: idx as i16 + 1,
                    duration_seconds: 0,
                })
                .unwrap();
        }
        mock
    }

    #[tokio::test]
    async fn start_terminates_the_previous_attempt() {
        let store = Arc::new(MemoryStore::new());
        let mock = mock(&store, &[SectionKind::Listening, SectionKind::Reading]);
        let svc = AttemptService::new(store.clone());
        let mut session = SessionState::empty("candidate-1");

        let first = svc.start(&mut session, &mock, None).await.unwrap();
        let second = svc.start(&mut session, &mock, None).await.unwrap();

        let first = store.find_attempt(first.id).await.unwrap().unwrap();
        assert_eq!(first.status, AttemptStatus::Terminated);
        assert!(first.finished_at.is_some());
        assert_eq!(second.status, AttemptStatus::InProgress);
        assert_eq!(session.active_attempt_id, Some(second.id));
        assert_eq!(session.active_mock_slug.as_deref(), Some("ielts-1"));

        let stored = store.load_session("candidate-1").await.unwrap();
        assert_eq!(stored.active_attempt_id, Some(second.id));
    }

    #[tokio::test]
    async fn start_defaults_to_first_configured_section() {
        let store = Arc::new(MemoryStore::new());
        let mock = mock(&store, &[SectionKind::Reading, SectionKind::Writing]);
        let svc = AttemptService::new(store);
        let mut session = SessionState::empty("c");

        let attempt = svc.start(&mut session, &mock, None).await.unwrap();
        assert_eq!(attempt.current_section, SectionKind::Reading);

        let attempt = svc
            .start(&mut session, &mock, Some(SectionKind::Writing))
            .await
            .unwrap();
        assert_eq!(attempt.current_section, SectionKind::Writing);
    }

    #[tokio::test]
    async fn terminate_twice_keeps_first_finish_time() {
        let store = Arc::new(MemoryStore::new());
        let mock = mock(&store, &[SectionKind::Listening]);
        let svc = AttemptService::new(store);
        let mut session = SessionState::empty("c");
        let attempt = svc.start(&mut session, &mock, None).await.unwrap();

        let once = svc.terminate(&attempt).await.unwrap();
        let twice = svc.terminate(&once).await.unwrap();
        assert_eq!(twice.status, AttemptStatus::Terminated);
        assert_eq!(once.finished_at, twice.finished_at);

        let err = svc.submit(&twice).await.unwrap_err();
        assert!(matches!(err, Error::AttemptNotActive));
    }
}
