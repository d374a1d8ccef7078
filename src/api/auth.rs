//! Account and session endpoints.
//!
//! - POST `/register` - Create an account and start a session
//! - POST `/login` - Start a session with email and password
//! - POST `/logout` - Clear the refresh token cookie
//! - POST `/refresh` - Exchange the refresh token cookie for a new access token

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::error::{ApiError, ResultExt};
use crate::auth::{CookiePolicy, read_refresh_token};
use crate::db::{CredentialError, Database, Principal};
use crate::jwt::{ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL, TokenError, TokenService};

#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub tokens: Arc<TokenService>,
    pub cookies: CookiePolicy,
}

pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
        .with_state(state)
}

#[derive(Deserialize)]
struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    access_token: String,
    user: Principal,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

fn token_err(e: TokenError) -> ApiError {
    error!("Failed to generate token: {}", e);
    ApiError::internal("Failed to generate token")
}

/// Issue an access token in the body and a refresh token in the cookie.
fn start_session(state: &AuthState, user: Principal) -> Result<impl IntoResponse + use<>, ApiError> {
    let access = state
        .tokens
        .issue(&user.id, ACCESS_TOKEN_TTL)
        .map_err(token_err)?;
    let refresh = state
        .tokens
        .issue(&user.id, REFRESH_TOKEN_TTL)
        .map_err(token_err)?;

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, state.cookies.refresh_cookie(&refresh))],
        Json(SessionResponse {
            access_token: access.token,
            user,
        }),
    ))
}

async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    const ALL_FIELDS_REQUIRED: &str = "All fields are required";

    let Json(payload) = payload.map_err(|_| ApiError::invalid_input(ALL_FIELDS_REQUIRED))?;

    let name = payload.name.as_deref().unwrap_or("").trim();
    let email = payload.email.as_deref().unwrap_or("").trim();
    let password = payload.password.as_deref().unwrap_or("");

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ApiError::invalid_input(ALL_FIELDS_REQUIRED));
    }

    let existing = state
        .db
        .users()
        .get_by_email(email)
        .await
        .db_err("Failed to check email availability")?;

    if existing.is_some() {
        return Err(ApiError::conflict("A user already exists with this email"));
    }

    let user = match state.db.users().create(name, email, password).await {
        Ok(user) => user,
        // Lost a race with a concurrent registration
        Err(CredentialError::EmailTaken) => {
            return Err(ApiError::conflict("A user already exists with this email"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to create user", e)),
    };

    info!(user_id = %user.id, "User registered");

    start_session(&state, user)
}

async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    const FIELDS_REQUIRED: &str = "Email and password are required";

    let Json(payload) = payload.map_err(|_| ApiError::invalid_input(FIELDS_REQUIRED))?;

    let email = payload.email.as_deref().unwrap_or("").trim();
    let password = payload.password.as_deref().unwrap_or("");

    if email.is_empty() || password.is_empty() {
        return Err(ApiError::invalid_input(FIELDS_REQUIRED));
    }

    let user = state
        .db
        .users()
        .verify_credentials(email, password)
        .await
        .db_err("Failed to verify credentials")?
        .ok_or_else(|| {
            debug!("Login rejected");
            ApiError::InvalidCredentials
        })?;

    info!(user_id = %user.id, "User logged in");

    start_session(&state, user)
}

/// Clear the refresh cookie. Tokens already issued stay valid until they expire.
async fn logout(State(state): State<AuthState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(SET_COOKIE, state.cookies.clear_refresh_cookie())],
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    )
}

/// Mint a new access token from the refresh cookie. The refresh token itself
/// is not rotated.
async fn refresh(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = read_refresh_token(&headers)
        .ok_or_else(|| ApiError::unauthenticated("No refresh token"))?;

    let claims = state
        .tokens
        .verify(refresh_token)
        .map_err(|_| ApiError::unauthenticated("Invalid or expired refresh token"))?;

    let user = state
        .db
        .users()
        .get_by_uuid(&claims.user_id)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::unauthenticated("No user exists"))?;

    let access = state
        .tokens
        .issue(&user.id, ACCESS_TOKEN_TTL)
        .map_err(token_err)?;

    Ok(Json(SessionResponse {
        access_token: access.token,
        user,
    }))
}
