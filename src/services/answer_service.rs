use std::sync::Arc;
use uuid::Uuid;

use crate::database::ExamStore;
use crate::error::{Error, Result};
use crate::models::answer::{AttemptAnswer, Response};
use crate::models::question::QuestionType;
use crate::services::gatekeeper::AttemptContext;
use crate::utils::time::now;

/// `mcq_multi` values arrive comma separated ("A,C").
pub fn normalize_response(question_type: QuestionType, raw_value: &str) -> Response {
    let raw_value = raw_value.trim();

    if question_type == QuestionType::McqMulti {
        let values = raw_value
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        return Response::Values { values };
    }

    if question_type.is_free_text() {
        return Response::Text {
            text: raw_value.to_string(),
        };
    }

    Response::Value {
        value: raw_value.to_string(),
    }
}

#[derive(Clone)]
pub struct AnswerService {
    store: Arc<dyn ExamStore>,
}

impl AnswerService {
    pub fn new(store: Arc<dyn ExamStore>) -> Self {
        Self { store }
    }

    /// Last write wins. Only questions of the current section's test are accepted.
    pub async fn save(
        &self,
        ctx: &AttemptContext,
        question_id: Uuid,
        raw_value: &str,
    ) -> Result<AttemptAnswer> {
        let section = ctx.attempt.current_section;
        let test = self
            .store
            .find_section_test(ctx.mock.id, section)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("{} test for mock {}", section, ctx.mock.slug))
            })?;

        let question = self
            .store
            .find_question(test.id, question_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    attempt_id = %ctx.attempt.id,
                    %question_id,
                    "Rejected answer for foreign question"
                );
                Error::ForeignQuestion(question_id.to_string())
            })?;

        let response = normalize_response(question.question_type, raw_value);
        let answer = self
            .store
            .upsert_answer(ctx.attempt.id, question.id, &response, now())
            .await?;

        tracing::debug!(
            attempt_id = %ctx.attempt.id,
            question_id = %question.id,
            qtype = %question.question_type,
            "Answer saved"
        );
        Ok(answer)
    }

    pub async fn answers_for(&self, ctx: &AttemptContext) -> Result<Vec<AttemptAnswer>> {
        self.store.list_answers(ctx.attempt.id).await
    }
}
