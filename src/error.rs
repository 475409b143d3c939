use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::models::section::SectionKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No active attempt for this session")]
    NoActiveAttempt,

    #[error("Attempt is on the {current} section, not {requested}")]
    WrongSection {
        current: SectionKind,
        requested: SectionKind,
    },

    #[error("Attempt is no longer in progress")]
    AttemptNotActive,

    #[error("{0} required")]
    MissingField(String),

    #[error("Question {0} does not belong to this test")]
    ForeignQuestion(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Guard rejections are recovered by sending the caller somewhere safe,
    /// never surfaced as server errors.
    pub fn is_guard_rejection(&self) -> bool {
        matches!(
            self,
            Error::NoActiveAttempt | Error::WrongSection { .. } | Error::AttemptNotActive
        )
    }

    fn code(&self) -> &'static str {
        match self {
            Error::NoActiveAttempt => "no_active_attempt",
            Error::WrongSection { .. } => "wrong_section",
            Error::AttemptNotActive => "attempt_not_active",
            Error::MissingField(_) => "missing_field",
            Error::ForeignQuestion(_) => "foreign_question",
            _ => "error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match &self {
            Error::NoActiveAttempt | Error::WrongSection { .. } | Error::AttemptNotActive => {
                (StatusCode::FORBIDDEN, self.to_string())
            }
            Error::MissingField(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::ForeignQuestion(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Error::Database(err) => {
                tracing::error!(error = ?err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = Json(json!({ "ok": false, "error": self.code(), "message": error_message }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
