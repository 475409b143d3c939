use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Extension, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::section_dto::{ActionResponse, SaveAnswerForm};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::section::SectionKind;
use crate::services::gatekeeper::{mock_landing, rejection_landing};
use crate::AppState;

/// Page, save-answer, submit and terminate endpoints for one section kind,
/// mounted under `/<kind>/`.
pub fn router(kind: SectionKind) -> Router<AppState> {
    let base = format!("/{}", kind);
    Router::new()
        .route(
            &format!("{}/", base),
            get(
                move |State(state): State<AppState>, Extension(claims): Extension<Claims>| {
                    section_page(state, claims, kind)
                },
            ),
        )
        .route(
            &format!("{}/save-answer/", base),
            post(
                move |State(state): State<AppState>,
                      Extension(claims): Extension<Claims>,
                      form: Option<Form<SaveAnswerForm>>| {
                    save_answer(state, claims, kind, form)
                },
            ),
        )
        .route(
            &format!("{}/submit/", base),
            post(
                move |State(state): State<AppState>, Extension(claims): Extension<Claims>| {
                    submit_section(state, claims, kind)
                },
            ),
        )
        .route(
            &format!("{}/terminate/", base),
            post(
                move |State(state): State<AppState>, Extension(claims): Extension<Claims>| {
                    terminate_attempt(state, claims, kind)
                },
            ),
        )
}

pub async fn section_page(
    state: AppState,
    claims: Claims,
    kind: SectionKind,
) -> Result<Response> {
    let session = state.store.load_session(&claims.sub).await?;
    let ctx = match state.gatekeeper.guard(&session, kind).await {
        Ok(ctx) => ctx,
        Err(err) if err.is_guard_rejection() => {
            let to = rejection_landing(&err, &session);
            return Ok(Redirect::to(&to).into_response());
        }
        Err(err) => return Err(err),
    };

    let page = state.section_service.page(&ctx).await?;
    Ok(Json(page).into_response())
}

pub async fn save_answer(
    state: AppState,
    claims: Claims,
    kind: SectionKind,
    form: Option<Form<SaveAnswerForm>>,
) -> Result<Response> {
    let session = state.store.load_session(&claims.sub).await?;
    let ctx = state.gatekeeper.guard(&session, kind).await?;

    // An absent or undecodable body carries no question id either.
    let missing = || Error::MissingField("question_id".to_string());
    let Some(Form(form)) = form else {
        return Err(missing());
    };
    form.validate().map_err(|_| missing())?;
    let raw_id = form.question_id.unwrap_or_default();
    let question_id = Uuid::parse_str(raw_id.trim())
        .map_err(|_| Error::ForeignQuestion(raw_id.clone()))?;

    state
        .answer_service
        .save(&ctx, question_id, &form.value)
        .await?;
    Ok(Json(ActionResponse::ok()).into_response())
}

pub async fn submit_section(
    state: AppState,
    claims: Claims,
    kind: SectionKind,
) -> Result<Response> {
    let session = state.store.load_session(&claims.sub).await?;
    let transition = match state.gatekeeper.guard(&session, kind).await {
        Ok(ctx) => state.section_service.submit(&ctx).await,
        Err(err) => Err(err),
    };

    match transition {
        Ok(transition) => {
            Ok(Json(ActionResponse::redirect(true, transition.redirect)).into_response())
        }
        Err(err) if err.is_guard_rejection() => Ok((
            StatusCode::BAD_REQUEST,
            Json(ActionResponse::redirect(false, mock_landing(&session))),
        )
            .into_response()),
        Err(err) => Err(err),
    }
}

pub async fn terminate_attempt(
    state: AppState,
    claims: Claims,
    kind: SectionKind,
) -> Result<Response> {
    let session = state.store.load_session(&claims.sub).await?;
    match state.section_service.terminate(&session).await? {
        Some(transition) => {
            tracing::info!(
                attempt_id = %transition.attempt.id,
                from = %kind,
                "Terminate requested"
            );
            Ok(Json(ActionResponse::redirect(true, transition.redirect)).into_response())
        }
        None => Ok((
            StatusCode::BAD_REQUEST,
            Json(ActionResponse::redirect(false, "/mocks/")),
        )
            .into_response()),
    }
}
