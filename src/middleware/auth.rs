use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::AppState;

/// Candidate identity carried by the bearer token. `sub` keys the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

fn claims_from_headers(headers: &HeaderMap, secret: &str) -> Result<Claims, &'static str> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing_authorization")?;
    let auth_str = auth_header.to_str().map_err(|_| "bad_authorization")?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or("unsupported_scheme")?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| "invalid_token")
}

pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match claims_from_headers(req.headers(), &state.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(code) => {
            tracing::debug!(reason = code, "Rejected unauthenticated request");
            (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
        }
    }
}

/// Attaches claims when a valid token is present; never rejects.
pub async fn optional_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Ok(claims) = claims_from_headers(req.headers(), &state.jwt_secret) {
        req.extensions_mut().insert(claims);
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::token::issue_token;
    use axum::http::HeaderValue;

    #[test]
    fn decodes_token_issued_with_same_secret() {
        let token = issue_token("candidate-7", "secret", 3600).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        let claims = claims_from_headers(&headers, "secret").unwrap();
        assert_eq!(claims.sub, "candidate-7");
        assert_eq!(claims_from_headers(&headers, "other").unwrap_err(), "invalid_token");
    }

    #[test]
    fn reports_missing_and_malformed_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            claims_from_headers(&headers, "secret").unwrap_err(),
            "missing_authorization"
        );
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic abc"),
        );
        assert_eq!(
            claims_from_headers(&headers, "secret").unwrap_err(),
            "unsupported_scheme"
        );
    }
}
