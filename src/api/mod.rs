mod auth;
mod error;
mod ideas;

use axum::{Router, extract::OriginalUri};
use std::sync::Arc;

use crate::auth::CookiePolicy;
use crate::db::Database;
use crate::jwt::TokenService;

pub use error::ApiError;

/// Create the API router.
pub fn create_api_router(db: Database, tokens: Arc<TokenService>, cookies: CookiePolicy) -> Router {
    let auth_state = auth::AuthState {
        db: db.clone(),
        tokens: tokens.clone(),
        cookies,
    };

    let ideas_state = ideas::IdeasState { db, tokens };

    Router::new()
        .nest("/auth", auth::router(auth_state))
        .nest("/ideas", ideas::router(ideas_state))
}

/// Fallback for unmatched paths.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(format!("Not found - {}", uri.path()))
}
