use axum::{
    extract::{FromRef, FromRequestParts},
    http::header,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, state::AppState};

/// A verified bearer token. Used on routes that reject anonymous callers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub subject: String,
    pub role: String,
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if user.role != "admin" {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// A logged-in customer recovered from an optional bearer token.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Optional auth: absent or invalid tokens fall through to guest, never reject.
#[derive(Debug, Clone, Default)]
pub struct OptionalUser(pub Option<SessionUser>);

fn bearer_token(parts: &axum::http::request::Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(decoded.claims)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;

        let claims =
            decode_claims(token, &state.config.jwt_secret).map_err(|_| AppError::Forbidden)?;

        Ok(AuthUser {
            subject: claims.sub,
            role: claims.role,
        })
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let Some(token) = bearer_token(parts) else {
            return Ok(OptionalUser(None));
        };

        let Ok(claims) = decode_claims(token, &state.config.jwt_secret) else {
            return Ok(OptionalUser(None));
        };

        let Ok(id) = Uuid::parse_str(&claims.sub) else {
            return Ok(OptionalUser(None));
        };

        Ok(OptionalUser(Some(SessionUser {
            id,
            name: claims.name,
            email: claims.email,
        })))
    }
}
