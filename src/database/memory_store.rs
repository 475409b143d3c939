use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::database::store::ExamStore;
use crate::error::{Error, Result};
use crate::models::answer::{AttemptAnswer, Response};
use crate::models::attempt::Attempt;
use crate::models::mock::{Mock, MockAccess, MockSection, Passage, QuestionGroup, SectionTest};
use crate::models::question::Question;
use crate::models::section::SectionKind;
use crate::models::session::SessionState;

#[derive(Default)]
struct Inner {
    mocks: Vec<Mock>,
    sections: Vec<MockSection>,
    tests: Vec<SectionTest>,
    passages: Vec<Passage>,
    groups: Vec<QuestionGroup>,
    questions: Vec<Question>,
    access: Vec<MockAccess>,
    attempts: HashMap<Uuid, Attempt>,
    answers: HashMap<(Uuid, Uuid), AttemptAnswer>,
    sessions: HashMap<String, SessionState>,
}

/// Process-local store for tests and `STORAGE_BACKEND=memory` runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }

    pub fn add_mock(&self, mock: Mock) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.mocks.iter().any(|m| m.slug == mock.slug) {
            return Err(Error::BadRequest(format!("duplicate mock slug '{}'", mock.slug)));
        }
        inner.mocks.push(mock);
        Ok(())
    }

    pub fn add_section(&self, section: MockSection) -> Result<()> {
        let mut inner = self.lock()?;
        if inner
            .sections
            .iter()
            .any(|s| s.mock_id == section.mock_id && s.section == section.section)
        {
            return Err(Error::BadRequest(format!(
                "mock already has a {} section",
                section.section
            )));
        }
        inner.sections.push(section);
        Ok(())
    }

    pub fn add_test(&self, test: SectionTest) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.tests.iter().any(|t| t.section_id == test.section_id) {
            return Err(Error::BadRequest("section already has a test".to_string()));
        }
        inner.tests.push(test);
        Ok(())
    }

    pub fn add_passage(&self, passage: Passage) -> Result<()> {
        self.lock()?.passages.push(passage);
        Ok(())
    }

    pub fn add_group(&self, group: QuestionGroup) -> Result<()> {
        self.lock()?.groups.push(group);
        Ok(())
    }

    pub fn add_question(&self, question: Question) -> Result<()> {
        let mut inner = self.lock()?;
        if inner
            .questions
            .iter()
            .any(|q| q.test_id == question.test_id && q.position == question.position)
        {
            return Err(Error::BadRequest(format!(
                "test already has a question at position {}",
                question.position
            )));
        }
        inner.questions.push(question);
        Ok(())
    }

    pub fn add_access(&self, access: MockAccess) -> Result<()> {
        self.lock()?.access.push(access);
        Ok(())
    }

    pub fn answer_count(&self) -> Result<usize> {
        Ok(self.lock()?.answers.len())
    }

    fn finish(
        &self,
        attempt_id: Uuid,
        submit: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<Attempt>> {
        let mut inner = self.lock()?;
        let Some(attempt) = inner.attempts.get_mut(&attempt_id) else {
            return Ok(None);
        };
        if submit {
            attempt.submit(now);
        } else {
            attempt.terminate(now);
        }
        Ok(Some(attempt.clone()))
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    async fn list_active_mocks(&self) -> Result<Vec<Mock>> {
        let inner = self.lock()?;
        let mut mocks: Vec<Mock> = inner.mocks.iter().filter(|m| m.is_active).cloned().collect();
        mocks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mocks)
    }

    async fn find_mock(&self, mock_id: Uuid) -> Result<Option<Mock>> {
        Ok(self.lock()?.mocks.iter().find(|m| m.id == mock_id).cloned())
    }

    async fn find_mock_by_slug(&self, slug: &str) -> Result<Option<Mock>> {
        Ok(self.lock()?.mocks.iter().find(|m| m.slug == slug).cloned())
    }

    async fn list_sections(&self, mock_id: Uuid) -> Result<Vec<MockSection>> {
        let inner = self.lock()?;
        let mut sections: Vec<MockSection> = inner
            .sections
            .iter()
            .filter(|s| s.mock_id == mock_id)
            .cloned()
            .collect();
        sections.sort_by_key(|s| s.position);
        Ok(sections)
    }

    async fn find_section_test(
        &self,
        mock_id: Uuid,
        kind: SectionKind,
    ) -> Result<Option<SectionTest>> {
        let inner = self.lock()?;
        let Some(section) = inner
            .sections
            .iter()
            .find(|s| s.mock_id == mock_id && s.section == kind)
        else {
            return Ok(None);
        };
        Ok(inner.tests.iter().find(|t| t.section_id == section.id).cloned())
    }

    async fn list_passages(&self, test_id: Uuid) -> Result<Vec<Passage>> {
        let inner = self.lock()?;
        let mut passages: Vec<Passage> = inner
            .passages
            .iter()
            .filter(|p| p.test_id == test_id)
            .cloned()
            .collect();
        passages.sort_by_key(|p| p.position);
        Ok(passages)
    }

    async fn list_groups(&self, test_id: Uuid) -> Result<Vec<QuestionGroup>> {
        let inner = self.lock()?;
        let mut groups: Vec<QuestionGroup> = inner
            .groups
            .iter()
            .filter(|g| g.test_id == test_id)
            .cloned()
            .collect();
        groups.sort_by_key(|g| g.position);
        Ok(groups)
    }

    async fn list_questions(&self, test_id: Uuid) -> Result<Vec<Question>> {
        let inner = self.lock()?;
        let mut questions: Vec<Question> = inner
            .questions
            .iter()
            .filter(|q| q.test_id == test_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.position);
        Ok(questions)
    }

    async fn find_question(&self, test_id: Uuid, question_id: Uuid) -> Result<Option<Question>> {
        Ok(self
            .lock()?
            .questions
            .iter()
            .find(|q| q.id == question_id && q.test_id == test_id)
            .cloned())
    }

    async fn count_questions(&self, test_id: Uuid) -> Result<i64> {
        let count = self
            .lock()?
            .questions
            .iter()
            .filter(|q| q.test_id == test_id)
            .count();
        Ok(count as i64)
    }

    async fn find_access(&self, subject: &str, mock_id: Uuid) -> Result<Option<MockAccess>> {
        Ok(self
            .lock()?
            .access
            .iter()
            .find(|a| a.subject == subject && a.mock_id == mock_id)
            .cloned())
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<()> {
        self.lock()?.attempts.insert(attempt.id, attempt.clone());
        Ok(())
    }

    async fn find_attempt(&self, attempt_id: Uuid) -> Result<Option<Attempt>> {
        Ok(self.lock()?.attempts.get(&attempt_id).cloned())
    }

    async fn terminate_attempt(
        &self,
        attempt_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Attempt>> {
        self.finish(attempt_id, false, now)
    }

    async fn submit_attempt(
        &self,
        attempt_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Attempt>> {
        self.finish(attempt_id, true, now)
    }

    async fn advance_section(
        &self,
        attempt_id: Uuid,
        from: SectionKind,
        to: SectionKind,
    ) -> Result<Option<Attempt>> {
        let mut inner = self.lock()?;
        Ok(inner
            .attempts
            .get_mut(&attempt_id)
            .filter(|a| a.is_in_progress() && a.current_section == from)
            .map(|a| {
                a.advance(to);
                a.clone()
            }))
    }

    async fn upsert_answer(
        &self,
        attempt_id: Uuid,
        question_id: Uuid,
        response: &Response,
        now: DateTime<Utc>,
    ) -> Result<AttemptAnswer> {
        let mut inner = self.lock()?;
        let answer = inner
            .answers
            .entry((attempt_id, question_id))
            .and_modify(|a| {
                a.response = response.clone();
                a.updated_at = now;
            })
            .or_insert_with(|| AttemptAnswer {
                id: Uuid::new_v4(),
                attempt_id,
                question_id,
                response: response.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(answer.clone())
    }

    async fn list_answers(&self, attempt_id: Uuid) -> Result<Vec<AttemptAnswer>> {
        let inner = self.lock()?;
        let mut answers: Vec<AttemptAnswer> = inner
            .answers
            .values()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect();
        answers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(answers)
    }

    async fn load_session(&self, subject: &str) -> Result<SessionState> {
        Ok(self
            .lock()?
            .sessions
            .get(subject)
            .cloned()
            .unwrap_or_else(|| SessionState::empty(subject)))
    }

    async fn save_session(&self, session: &SessionState) -> Result<()> {
        let mut stored = session.clone();
        stored.updated_at = Some(Utc::now());
        self.lock()?.sessions.insert(session.subject.clone(), stored);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn advance_section_only_moves_from_the_expected_section() {
        let store = MemoryStore::new();
        let attempt = Attempt::new(Uuid::new_v4(), SectionKind::Listening, Utc::now());
        store.insert_attempt(&attempt).await.unwrap();

        let moved = store
            .advance_section(attempt.id, SectionKind::Listening, SectionKind::Reading)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.current_section, SectionKind::Reading);

        let stale = store
            .advance_section(attempt.id, SectionKind::Listening, SectionKind::Reading)
            .await
            .unwrap();
        assert!(stale.is_none());

        store.terminate_attempt(attempt.id, Utc::now()).await.unwrap();
        let closed = store
            .advance_section(attempt.id, SectionKind::Reading, SectionKind::Writing)
            .await
            .unwrap();
        assert!(closed.is_none());
        let stored = store.find_attempt(attempt.id).await.unwrap().unwrap();
        assert_eq!(stored.current_section, SectionKind::Reading);
    }
}
