//! Axum extractor for bearer-token authentication.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tracing::{debug, error};

use super::errors::{ApiAuthError, AuthErrorKind};
use super::state::HasAuthBackend;
use crate::db::Principal;

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Verify the bearer token and resolve the principal it names.
pub async fn authenticate<S>(headers: &HeaderMap, state: &S) -> Result<Principal, AuthErrorKind>
where
    S: HasAuthBackend + Send + Sync,
{
    let token = bearer_token(headers).ok_or(AuthErrorKind::NotAuthenticated)?;

    let claims = state.tokens().verify(token).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        AuthErrorKind::InvalidToken
    })?;

    state
        .db()
        .users()
        .get_by_uuid(&claims.user_id)
        .await
        .map_err(|e| {
            error!("Failed to get user: {}", e);
            AuthErrorKind::DatabaseError
        })?
        .ok_or_else(|| {
            debug!(user_id = %claims.user_id, "Token names a user that no longer exists");
            AuthErrorKind::UserNotFound
        })
}

/// Extractor for endpoints that require a valid access token.
/// The handler receives the resolved principal; on failure the handler never runs.
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, state)
            .await
            .map(Authenticated)
            .map_err(ApiAuthError::from)
    }
}
