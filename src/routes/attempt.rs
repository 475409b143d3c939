use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
    Extension,
};

use crate::dto::section_dto::{AttemptStatusResponse, AttemptSummary};
use crate::error::Error;
use crate::middleware::auth::Claims;
use crate::AppState;

#[axum::debug_handler]
pub async fn attempt_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Response> {
    let session = state.store.load_session(&claims.sub).await?;
    let ctx = state
        .gatekeeper
        .resolve(&session)
        .await?
        .ok_or_else(|| Error::NotFound("No attempt for this session".to_string()))?;

    let answers = state.answer_service.answers_for(&ctx).await?;
    Ok(Json(AttemptStatusResponse {
        attempt: AttemptSummary::from(&ctx.attempt),
        mock_slug: ctx.mock.slug.clone(),
        answers_recorded: answers.len(),
    })
    .into_response())
}
