//! Authentication middleware
//!
//! Bearer-JWT verification (HS256). Token issuance lives with the external
//! identity provider; this layer only validates what arrives and attaches
//! the caller's identity to the request. `AUTH_MODE=none` maps every
//! request to an anonymous user for local use.

use crate::models::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const ANONYMOUS_USER: &str = "anonymous";

/// Authenticated identity, inserted into request extensions for handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.config.auth.mode == "none" {
        req.extensions_mut()
            .insert(AuthUser(ANONYMOUS_USER.to_string()));
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    match verify_jwt(token, &state.config.auth.secret) {
        Ok(claims) => {
            req.extensions_mut().insert(AuthUser(claims.sub));
            Ok(next.run(req).await)
        }
        Err(e) => {
            warn!(error = %e, "rejected bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Mint a token for `user_id`. Kept for local tooling and tests; the
/// production issuer is external.
pub fn issue_jwt(
    user_id: &str,
    secret: &str,
    expiration_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + expiration_secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_round_trip() {
        let token = issue_jwt("user-42", "secret", 3600).unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, "user-42");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_jwt("user-42", "secret", 3600).unwrap();
        assert!(verify_jwt(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_jwt("user-42", "secret", -120).unwrap();
        assert!(verify_jwt(&token, "secret").is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(verify_jwt("not-a-jwt", "secret").is_err());
    }
}
