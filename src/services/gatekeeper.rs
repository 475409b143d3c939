use std::sync::Arc;

use crate::database::ExamStore;
use crate::error::{Error, Result};
use crate::models::attempt::Attempt;
use crate::models::mock::Mock;
use crate::models::section::SectionKind;
use crate::models::session::SessionState;

/// The active attempt, resolved once per request and handed explicitly to
/// every section operation.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    pub session: SessionState,
    pub attempt: Attempt,
    pub mock: Mock,
}

#[derive(Clone)]
pub struct Gatekeeper {
    store: Arc<dyn ExamStore>,
}

impl Gatekeeper {
    pub fn new(store: Arc<dyn ExamStore>) -> Self {
        Self { store }
    }

    /// Same lookup as `guard`, without the status and section checks.
    pub async fn resolve(&self, session: &SessionState) -> Result<Option<AttemptContext>> {
        let Some(attempt_id) = session.active_attempt_id else {
            return Ok(None);
        };
        let Some(attempt) = self.store.find_attempt(attempt_id).await? else {
            return Ok(None);
        };
        let mock = self
            .store
            .find_mock(attempt.mock_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("mock {}", attempt.mock_id)))?;
        Ok(Some(AttemptContext {
            session: session.clone(),
            attempt,
            mock,
        }))
    }

    /// Admits the request only if the session's attempt exists, is still in
    /// progress and is currently on `kind`.
    pub async fn guard(&self, session: &SessionState, kind: SectionKind) -> Result<AttemptContext> {
        let ctx = self.resolve(session).await?.ok_or(Error::NoActiveAttempt);
        let ctx = match ctx {
            Ok(ctx) => ctx,
            Err(err) => {
                tracing::warn!(subject = %session.subject, section = %kind, "No active attempt");
                return Err(err);
            }
        };

        if !ctx.attempt.is_in_progress() {
            tracing::warn!(
                attempt_id = %ctx.attempt.id,
                status = %ctx.attempt.status,
                section = %kind,
                "Attempt not active"
            );
            return Err(Error::AttemptNotActive);
        }
        if ctx.attempt.current_section != kind {
            tracing::warn!(
                attempt_id = %ctx.attempt.id,
                current = %ctx.attempt.current_section,
                requested = %kind,
                "Section mismatch"
            );
            return Err(Error::WrongSection {
                current: ctx.attempt.current_section,
                requested: kind,
            });
        }
        Ok(ctx)
    }
}

/// Mock detail page when the session points at an attempt, else the list.
pub fn mock_landing(session: &SessionState) -> String {
    match (&session.active_attempt_id, &session.active_mock_slug) {
        (Some(_), Some(slug)) => format!("/mocks/{}/", slug),
        _ => "/mocks/".to_string(),
    }
}

pub fn rejection_landing(err: &Error, session: &SessionState) -> String {
    match err {
        Error::WrongSection { current, .. } => current.page_path(),
        Error::AttemptNotActive => mock_landing(session),
        _ => "/mocks/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::MockExamStore;
    use chrono::Utc;
    use uuid::Uuid;

    fn fixture(kind: SectionKind) -> (Mock, Attempt, SessionState) {
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
        let attempt = Attempt::new(mock.id, kind, Utc::now());
        let session = SessionState {
            subject: "candidate".into(),
            active_attempt_id: Some(attempt.id),
            active_mock_slug: Some(mock.slug.clone()),
            updated_at: None,
        };
        (mock, attempt, session)
    }

    fn store_with(mock: Mock, attempt: Attempt) -> Arc<dyn ExamStore> {
        let mut store = MockExamStore::new();
        store
            .expect_find_attempt()
            .returning(move |_| Ok(Some(attempt.clone())));
        store
            .expect_find_mock()
            .returning(move |_| Ok(Some(mock.clone())));
        Arc::new(store)
    }

    #[tokio::test]
    async fn admits_matching_in_progress_attempt() {
        let (mock, attempt, session) = fixture(SectionKind::Listening);
        let gate = Gatekeeper::new(store_with(mock, attempt.clone()));

        let ctx = gate.guard(&session, SectionKind::Listening).await.unwrap();
        assert_eq!(ctx.attempt.id, attempt.id);
        assert_eq!(ctx.mock.slug, "ielts-1");
    }

    #[tokio::test]
    async fn rejects_section_mismatch_even_when_in_progress() {
        let (mock, attempt, session) = fixture(SectionKind::Listening);
        let gate = Gatekeeper::new(store_with(mock, attempt));

        let err = gate.guard(&session, SectionKind::Reading).await.unwrap_err();
        assert!(matches!(
            err,
            Error::WrongSection {
                current: SectionKind::Listening,
                requested: SectionKind::Reading
            }
        ));
        assert_eq!(rejection_landing(&err, &session), "/listening/");
    }

    #[tokio::test]
    async fn rejects_finished_attempt() {
        let (mock, mut attempt, session) = fixture(SectionKind::Reading);
        attempt.terminate(Utc::now());
        let gate = Gatekeeper::new(store_with(mock, attempt));

        let err = gate.guard(&session, SectionKind::Reading).await.unwrap_err();
        assert!(matches!(err, Error::AttemptNotActive));
        assert_eq!(rejection_landing(&err, &session), "/mocks/ielts-1/");
    }

    #[tokio::test]
    async fn rejects_session_without_pointer() {
        let store: Arc<dyn ExamStore> = Arc::new(MockExamStore::new());
        let gate = Gatekeeper::new(store);
        let session = SessionState::empty("nobody");

        let err = gate.guard(&session, SectionKind::Listening).await.unwrap_err();
        assert!(matches!(err, Error::NoActiveAttempt));
        assert_eq!(rejection_landing(&err, &session), "/mocks/");
        assert_eq!(mock_landing(&session), "/mocks/");
    }
}
