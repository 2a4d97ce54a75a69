use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use db::models::user::User;

use crate::{AppState, error::ApiError};

/// The signed-in user, resolved from an `Authorization: Bearer` access token.
pub struct AuthUser(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;
        let user = state.auth().authenticate(token).await?;
        Ok(AuthUser(user))
    }
}
