use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Redirect, Response},
    Extension,
};

use crate::dto::mock_dto::{MockListResponse, MockSummary, StartQuery};
use crate::middleware::auth::Claims;
use crate::services::mock_service::StartOutcome;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_mocks(State(state): State<AppState>) -> crate::error::Result<Response> {
    let mocks = state.mock_service.list().await?;
    let items = mocks.iter().map(MockSummary::from).collect();
    Ok(Json(MockListResponse { items }).into_response())
}

#[axum::debug_handler]
pub async fn mock_detail(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(slug): Path<String>,
) -> crate::error::Result<Response> {
    let subject = claims.as_ref().map(|Extension(c)| c.sub.as_str());
    let detail = state.mock_service.detail(&slug, subject).await?;
    Ok(Json(detail).into_response())
}

#[axum::debug_handler]
pub async fn start_mock(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(slug): Path<String>,
    Query(query): Query<StartQuery>,
) -> crate::error::Result<Response> {
    match state
        .mock_service
        .start(&claims.sub, &slug, query.section)
        .await?
    {
        StartOutcome::Started(attempt) => {
            Ok(Redirect::to(&attempt.current_section.page_path()).into_response())
        }
        StartOutcome::AccessDenied(mock) => Ok(Redirect::to(&mock.detail_path()).into_response()),
    }
}
