use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::models::answer::Response;
use crate::models::attempt::{Attempt, AttemptStatus};
use crate::models::mock::{Passage, QuestionGroup, SectionTest};
use crate::models::question::{Question, QuestionType};
use crate::models::section::SectionKind;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveAnswerForm {
    #[validate(required, length(min = 1))]
    pub question_id: Option<String>,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            redirect: None,
        }
    }

    pub fn redirect(ok: bool, to: impl Into<String>) -> Self {
        Self {
            ok,
            redirect: Some(to.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub id: Uuid,
    pub mock_id: Uuid,
    pub status: AttemptStatus,
    pub current_section: SectionKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&Attempt> for AttemptSummary {
    fn from(a: &Attempt) -> Self {
        Self {
            id: a.id,
            mock_id: a.mock_id,
            status: a.status,
            current_section: a.current_section,
            started_at: a.started_at,
            finished_at: a.finished_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptStatusResponse {
    pub attempt: AttemptSummary,
    pub mock_slug: String,
    pub answers_recorded: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionView {
    pub label: String,
    pub text: String,
}

/// Question as shown to the candidate. Answer keys are never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub position: i16,
    pub part: i16,
    pub group_id: Option<Uuid>,
    pub passage_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub prompt: String,
    pub instructions: String,
    pub data: JsonValue,
    pub options: Vec<OptionView>,
}

impl From<Question> for QuestionView {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            position: q.position,
            part: q.part,
            group_id: q.group_id,
            passage_id: q.passage_id,
            question_type: q.question_type,
            prompt: q.prompt,
            instructions: q.instructions,
            data: q.data,
            options: q
                .options
                .into_iter()
                .map(|o| OptionView {
                    label: o.label,
                    text: o.text,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionPageResponse {
    pub section: SectionKind,
    pub mock_slug: String,
    pub attempt: AttemptSummary,
    pub test: SectionTest,
    pub total_seconds: i32,
    pub passages: Vec<Passage>,
    pub groups: Vec<QuestionGroup>,
    pub questions: Vec<QuestionView>,
    pub answers: HashMap<Uuid, Response>,
}
