use chrono::Duration;
use jsonwebtoken::{encode, EncodingKey, Header};

use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::utils::time::now;

pub fn issue_token(subject: &str, secret: &str, ttl_seconds: i64) -> Result<String> {
    let exp = (now() + Duration::seconds(ttl_seconds)).timestamp();
    let claims = Claims {
        sub: subject.to_string(),
        exp: usize::try_from(exp).map_err(|_| Error::Internal("token expiry before epoch".into()))?,
        role: Some("candidate".to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}
