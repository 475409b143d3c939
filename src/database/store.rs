use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::answer::{AttemptAnswer, Response};
use crate::models::attempt::Attempt;
use crate::models::mock::{Mock, MockAccess, MockSection, Passage, QuestionGroup, SectionTest};
use crate::models::question::Question;
use crate::models::section::SectionKind;
use crate::models::session::SessionState;

/// Persistence for exam content, attempts, answers and session pointers.
/// Content is read-only here; it is seeded externally.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn list_active_mocks(&self) -> Result<Vec<Mock>>;
    async fn find_mock(&self, mock_id: Uuid) -> Result<Option<Mock>>;
    async fn find_mock_by_slug(&self, slug: &str) -> Result<Option<Mock>>;
    /// Sections of a mock, ordered by position.
    async fn list_sections(&self, mock_id: Uuid) -> Result<Vec<MockSection>>;
    async fn find_section_test(
        &self,
        mock_id: Uuid,
        kind: SectionKind,
    ) -> Result<Option<SectionTest>>;
    async fn list_passages(&self, test_id: Uuid) -> Result<Vec<Passage>>;
    async fn list_groups(&self, test_id: Uuid) -> Result<Vec<QuestionGroup>>;
    /// Questions of a test with their options, ordered by position.
    async fn list_questions(&self, test_id: Uuid) -> Result<Vec<Question>>;
    async fn find_question(&self, test_id: Uuid, question_id: Uuid) -> Result<Option<Question>>;
    async fn count_questions(&self, test_id: Uuid) -> Result<i64>;
    async fn find_access(&self, subject: &str, mock_id: Uuid) -> Result<Option<MockAccess>>;

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<()>;
    async fn find_attempt(&self, attempt_id: Uuid) -> Result<Option<Attempt>>;
    /// Moves an in-progress attempt to `terminated`. Returns the attempt as
    /// stored afterwards, unchanged if it was already terminal.
    async fn terminate_attempt(
        &self,
        attempt_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Attempt>>;
    async fn submit_attempt(
        &self,
        attempt_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Attempt>>;
    /// Moves the attempt from `from` to `to` only while it is in progress and
    /// still on `from`. `None` when nothing matched.
    async fn advance_section(
        &self,
        attempt_id: Uuid,
        from: SectionKind,
        to: SectionKind,
    ) -> Result<Option<Attempt>>;

    async fn upsert_answer(
        &self,
        attempt_id: Uuid,
        question_id: Uuid,
        response: &Response,
        now: DateTime<Utc>,
    ) -> Result<AttemptAnswer>;
    async fn list_answers(&self, attempt_id: Uuid) -> Result<Vec<AttemptAnswer>>;

    async fn load_session(&self, subject: &str) -> Result<SessionState>;
    async fn save_session(&self, session: &SessionState) -> Result<()>;
}
