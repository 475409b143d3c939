use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

pub fn frontend_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::LOCATION])
        .allow_origin(Any)
}
