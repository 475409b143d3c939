pub mod attempt;
pub mod health;
pub mod mocks;
pub mod sections;

use axum::{middleware::from_fn_with_state, routing::get, Router};

use crate::middleware::auth::{optional_bearer_auth, require_bearer_auth};
use crate::middleware::rate_limit::{new_rps_state, rps_middleware};
use crate::models::section::SectionKind;
use crate::AppState;

/// Full HTTP surface. Catalogue pages are public; everything touching an
/// attempt needs a bearer token.
pub fn app_router(state: AppState, rps: u32) -> Router {
    let public = Router::new()
        .route("/mocks/", get(mocks::list_mocks))
        .route("/mocks/:slug/", get(mocks::mock_detail))
        .layer(from_fn_with_state(state.clone(), optional_bearer_auth));

    let mut candidate = Router::new()
        .route(
            "/mocks/:slug/start/",
            get(mocks::start_mock).post(mocks::start_mock),
        )
        .route("/attempt", get(attempt::attempt_status));
    for kind in SectionKind::ALL {
        candidate = candidate.merge(sections::router(kind));
    }
    let candidate = candidate.layer(from_fn_with_state(state.clone(), require_bearer_auth));

    let api = public
        .merge(candidate)
        .layer(from_fn_with_state(new_rps_state(rps), rps_middleware));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .with_state(state)
}
