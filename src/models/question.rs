use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Short,
    Tfng,
    Yesno,
    McqSingle,
    McqMulti,
    Matching,
    Map,
    Heading,
    Essay,
    Speaking,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Short => "short",
            QuestionType::Tfng => "tfng",
            QuestionType::Yesno => "yesno",
            QuestionType::McqSingle => "mcq_single",
            QuestionType::McqMulti => "mcq_multi",
            QuestionType::Matching => "matching",
            QuestionType::Map => "map",
            QuestionType::Heading => "heading",
            QuestionType::Essay => "essay",
            QuestionType::Speaking => "speaking",
        }
    }

    /// Free-text questions are answered with `{text}`.
    pub fn is_free_text(&self) -> bool {
        matches!(
            self,
            QuestionType::Short | QuestionType::Essay | QuestionType::Speaking
        )
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(JsonValue::String(s.to_string()))
            .map_err(|_| UnknownVariant::new("question type", s))
    }
}

impl TryFrom<String> for QuestionType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextKey {
    pub values: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub max_words: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceKey {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoicesKey {
    pub values: Vec<String>,
}

/// Answer key, shaped by the question type it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerKey {
    Text(TextKey),
    Choice(ChoiceKey),
    Choices(ChoicesKey),
    None,
}

impl AnswerKey {
    pub fn decode(question_type: QuestionType, raw: &JsonValue) -> serde_json::Result<Self> {
        let empty = match raw {
            JsonValue::Null => true,
            JsonValue::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            return Ok(AnswerKey::None);
        }
        let key = match question_type {
            QuestionType::Essay | QuestionType::Speaking => AnswerKey::None,
            QuestionType::Short => AnswerKey::Text(serde_json::from_value(raw.clone())?),
            QuestionType::McqMulti => AnswerKey::Choices(serde_json::from_value(raw.clone())?),
            _ => AnswerKey::Choice(serde_json::from_value(raw.clone())?),
        };
        Ok(key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct QuestionOption {
    pub id: Uuid,
    pub question_id: Uuid,
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: Uuid,
    pub test_id: Uuid,
    pub group_id: Option<Uuid>,
    pub passage_id: Option<Uuid>,
    pub position: i16,
    pub part: i16,
    pub question_type: QuestionType,
    pub prompt: String,
    pub instructions: String,
    pub data: JsonValue,
    pub answer_key: AnswerKey,
    pub options: Vec<QuestionOption>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn question_type_round_trips_through_text() {
        assert_eq!("mcq_multi".parse::<QuestionType>().unwrap(), QuestionType::McqMulti);
        assert_eq!(QuestionType::McqSingle.to_string(), "mcq_single");
        assert!("essay_long".parse::<QuestionType>().is_err());
    }

    #[test]
    fn answer_key_shape_follows_question_type() {
        let key = AnswerKey::decode(
            QuestionType::Short,
            &json!({"values": ["johnson"], "max_words": 1}),
        )
        .unwrap();
        assert_eq!(
            key,
            AnswerKey::Text(TextKey {
                values: vec!["johnson".into()],
                case_sensitive: false,
                max_words: Some(1),
            })
        );

        let key =
            AnswerKey::decode(QuestionType::McqMulti, &json!({"values": ["A", "C"]})).unwrap();
        assert!(matches!(key, AnswerKey::Choices(ref k) if k.values == ["A", "C"]));

        let key = AnswerKey::decode(QuestionType::Tfng, &json!({"value": "True"})).unwrap();
        assert_eq!(
            key,
            AnswerKey::Choice(ChoiceKey {
                value: "True".into()
            })
        );

        assert_eq!(AnswerKey::decode(QuestionType::Map, &json!({})).unwrap(), AnswerKey::None);
    }

    #[test]
    fn malformed_answer_key_is_rejected() {
        assert!(AnswerKey::decode(QuestionType::McqSingle, &json!({"values": ["A"]})).is_err());
    }
}
