use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::debug;
use uuid::Uuid;

use crate::auth::tokens::TokenKind;
use crate::errors::AppError;
use crate::state::AppState;

/// The caller of an authenticated route. Rejects with 401 without a valid access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

/// The caller of a public route: `Some` with a valid access token, otherwise anonymous.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Uuid>);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        state.tokens.verify(token, TokenKind::Access).map(AuthUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(MaybeUser(None));
        };
        match state.tokens.verify(token, TokenKind::Access) {
            Ok(user_id) => Ok(MaybeUser(Some(user_id))),
            Err(_) => {
                debug!("Ignoring invalid bearer token on public route");
                Ok(MaybeUser(None))
            }
        }
    }
}
