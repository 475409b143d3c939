use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::store::ExamStore;
use crate::error::{Error, Result};
use crate::models::answer::{AttemptAnswer, Response};
use crate::models::attempt::Attempt;
use crate::models::mock::{Mock, MockAccess, MockSection, Passage, QuestionGroup, SectionTest};
use crate::models::question::{AnswerKey, Question, QuestionOption, QuestionType};
use crate::models::section::SectionKind;
use crate::models::session::SessionState;

#[derive(Debug, FromRow)]
struct QuestionRow {
    id: Uuid,
    test_id: Uuid,
    group_id: Option<Uuid>,
    passage_id: Option<Uuid>,
    position: i16,
    part: i16,
    qtype: String,
    prompt: String,
    instructions: String,
    data: JsonValue,
    answer_key: JsonValue,
}

impl QuestionRow {
    fn into_question(self, options: Vec<QuestionOption>) -> Result<Question> {
        let question_type: QuestionType = self
            .qtype
            .parse()
            .map_err(|e| Error::Internal(format!("question {}: {}", self.id, e)))?;
        let answer_key = AnswerKey::decode(question_type, &self.answer_key)
            .map_err(|e| Error::Internal(format!("question {}: {}", self.id, e)))?;
        Ok(Question {
            id: self.id,
            test_id: self.test_id,
            group_id: self.group_id,
            passage_id: self.passage_id,
            position: self.position,
            part: self.part,
            question_type,
            prompt: self.prompt,
            instructions: self.instructions,
            data: self.data,
            answer_key,
            options,
        })
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn options_for(
        &self,
        question_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<QuestionOption>>> {
        let rows = sqlx::query_as::<_, QuestionOption>(
            r#"SELECT id, question_id, label, text FROM question_options
               WHERE question_id = ANY($1) ORDER BY label"#,
        )
        .bind(question_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_question: HashMap<Uuid, Vec<QuestionOption>> = HashMap::new();
        for option in rows {
            by_question.entry(option.question_id).or_default().push(option);
        }
        Ok(by_question)
    }

    async fn finish_attempt(
        &self,
        attempt_id: Uuid,
        status: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Attempt>> {
        let updated = sqlx::query_as::<_, Attempt>(
            r#"
            UPDATE attempts
            SET status = $2, finished_at = $3
            WHERE id = $1 AND status = 'in_progress'
            RETURNING *
            "#,
        )
        .bind(attempt_id)
        .bind(status)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(attempt) => Ok(Some(attempt)),
            None => self.find_attempt(attempt_id).await,
        }
    }
}

#[async_trait]
impl ExamStore for PgStore {
    async fn list_active_mocks(&self) -> Result<Vec<Mock>> {
        let mocks = sqlx::query_as::<_, Mock>(
            r#"SELECT * FROM mocks WHERE is_active = TRUE ORDER BY created_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(mocks)
    }

    async fn find_mock(&self, mock_id: Uuid) -> Result<Option<Mock>> {
        let mock = sqlx::query_as::<_, Mock>(r#"SELECT * FROM mocks WHERE id = $1"#)
            .bind(mock_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(mock)
    }

    async fn find_mock_by_slug(&self, slug: &str) -> Result<Option<Mock>> {
        let mock = sqlx::query_as::<_, Mock>(r#"SELECT * FROM mocks WHERE slug = $1"#)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(mock)
    }

    async fn list_sections(&self, mock_id: Uuid) -> Result<Vec<MockSection>> {
        let sections = sqlx::query_as::<_, MockSection>(
            r#"SELECT * FROM mock_sections WHERE mock_id = $1 ORDER BY position"#,
        )
        .bind(mock_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sections)
    }

    async fn find_section_test(
        &self,
        mock_id: Uuid,
        kind: SectionKind,
    ) -> Result<Option<SectionTest>> {
        let test = sqlx::query_as::<_, SectionTest>(
            r#"
            SELECT t.id, t.section_id, t.title, t.duration_seconds, t.audio_path
            FROM section_tests t
            JOIN mock_sections s ON s.id = t.section_id
            WHERE s.mock_id = $1 AND s.section = $2
            "#,
        )
        .bind(mock_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(test)
    }

    async fn list_passages(&self, test_id: Uuid) -> Result<Vec<Passage>> {
        let passages = sqlx::query_as::<_, Passage>(
            r#"SELECT * FROM passages WHERE test_id = $1 ORDER BY position"#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(passages)
    }

    async fn list_groups(&self, test_id: Uuid) -> Result<Vec<QuestionGroup>> {
        let groups = sqlx::query_as::<_, QuestionGroup>(
            r#"SELECT * FROM question_groups WHERE test_id = $1 ORDER BY position"#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    async fn list_questions(&self, test_id: Uuid) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"SELECT * FROM questions WHERE test_id = $1 ORDER BY position"#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut options = self.options_for(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let opts = options.remove(&row.id).unwrap_or_default();
                row.into_question(opts)
            })
            .collect()
    }

    async fn find_question(&self, test_id: Uuid, question_id: Uuid) -> Result<Option<Question>> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"SELECT * FROM questions WHERE id = $1 AND test_id = $2"#,
        )
        .bind(question_id)
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut options = self.options_for(&[row.id]).await?;
        let opts = options.remove(&row.id).unwrap_or_default();
        row.into_question(opts).map(Some)
    }

    async fn count_questions(&self, test_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM questions WHERE test_id = $1"#)
            .bind(test_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_access(&self, subject: &str, mock_id: Uuid) -> Result<Option<MockAccess>> {
        let access = sqlx::query_as::<_, MockAccess>(
            r#"SELECT * FROM mock_access WHERE subject = $1 AND mock_id = $2"#,
        )
        .bind(subject)
        .bind(mock_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(access)
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO attempts (id, mock_id, status, current_section, started_at, finished_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.mock_id)
        .bind(attempt.status.as_str())
        .bind(attempt.current_section.as_str())
        .bind(attempt.started_at)
        .bind(attempt.finished_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_attempt(&self, attempt_id: Uuid) -> Result<Option<Attempt>> {
        let attempt = sqlx::query_as::<_, Attempt>(r#"SELECT * FROM attempts WHERE id = $1"#)
            .bind(attempt_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(attempt)
    }

    async fn terminate_attempt(
        &self,
        attempt_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Attempt>> {
        self.finish_attempt(attempt_id, "terminated", now).await
    }

    async fn submit_attempt(
        &self,
        attempt_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Attempt>> {
        self.finish_attempt(attempt_id, "submitted", now).await
    }

    async fn advance_section(
        &self,
        attempt_id: Uuid,
        from: SectionKind,
        to: SectionKind,
    ) -> Result<Option<Attempt>> {
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            UPDATE attempts
            SET current_section = $3
            WHERE id = $1 AND status = 'in_progress' AND current_section = $2
            RETURNING *
            "#,
        )
        .bind(attempt_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempt)
    }

    async fn upsert_answer(
        &self,
        attempt_id: Uuid,
        question_id: Uuid,
        response: &Response,
        now: DateTime<Utc>,
    ) -> Result<AttemptAnswer> {
        let answer = sqlx::query_as::<_, AttemptAnswer>(
            r#"
            INSERT INTO attempt_answers
                (id, attempt_id, question_id, response, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (attempt_id, question_id)
            DO UPDATE SET response = EXCLUDED.response, updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(attempt_id)
        .bind(question_id)
        .bind(Json(response))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(answer)
    }

    async fn list_answers(&self, attempt_id: Uuid) -> Result<Vec<AttemptAnswer>> {
        let answers = sqlx::query_as::<_, AttemptAnswer>(
            r#"SELECT * FROM attempt_answers WHERE attempt_id = $1 ORDER BY created_at"#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }

    async fn load_session(&self, subject: &str) -> Result<SessionState> {
        let session = sqlx::query_as::<_, SessionState>(
            r#"SELECT * FROM exam_sessions WHERE subject = $1"#,
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session.unwrap_or_else(|| SessionState::empty(subject)))
    }

    async fn save_session(&self, session: &SessionState) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO exam_sessions (subject, active_attempt_id, active_mock_slug, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (subject)
            DO UPDATE SET active_attempt_id = EXCLUDED.active_attempt_id,
                          active_mock_slug = EXCLUDED.active_mock_slug,
                          updated_at = NOW()
            "#,
        )
        .bind(&session.subject)
        .bind(session.active_attempt_id)
        .bind(&session.active_mock_slug)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};
    use serde_json::json;

    fn row(qtype: &str, answer_key: JsonValue) -> QuestionRow {
        QuestionRow {
            id: Uuid::new_v4(),
            test_id: Uuid::new_v4(),
            group_id: None,
            passage_id: None,
            position: 1,
            part: 1,
            qtype: qtype.to_string(),
            prompt: "Choose".into(),
            instructions: String::new(),
            data: json!({}),
            answer_key,
        }
    }

    #[test]
    fn malformed_stored_answer_key_is_a_server_fault() {
        let err = row("mcq_single", json!({"values": ["A"]}))
            .into_question(Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = row("essay_long", json!({})).into_question(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn well_formed_row_decodes_its_key() {
        let question = row("tfng", json!({"value": "False"}))
            .into_question(Vec::new())
            .unwrap();
        assert_eq!(question.question_type, QuestionType::Tfng);
        assert!(matches!(question.answer_key, AnswerKey::Choice(ref k) if k.value == "False"));
    }
}
