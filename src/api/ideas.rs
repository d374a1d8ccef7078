//! Ideas API.
//!
//! Reads are public. Creating requires a bearer token; updating and deleting
//! additionally require the caller to own the idea.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt, require_uuid};
use crate::auth::{Access, Authenticated, authorize};
use crate::db::{Database, Idea, IdeaFields};
use crate::impl_has_auth_backend;
use crate::jwt::TokenService;

const IDEA_NOT_FOUND: &str = "Idea not found";
const FIELDS_REQUIRED: &str = "Title, summary and description are required";

/// State for ideas endpoints.
#[derive(Clone)]
pub struct IdeasState {
    pub db: Database,
    pub tokens: Arc<TokenService>,
}

impl_has_auth_backend!(IdeasState);

pub fn router(state: IdeasState) -> Router {
    Router::new()
        .route("/", get(list_ideas).post(create_idea))
        .route(
            "/{id}",
            get(get_idea).put(update_idea).delete(delete_idea),
        )
        .with_state(state)
}

// --- Request/Response types ---

/// Tags arrive either as `"a, b, c"` or as `["a", "b", "c"]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagsInput {
    List(Vec<String>),
    Text(String),
}

#[derive(Deserialize)]
struct IdeaRequest {
    title: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    tags: Option<TagsInput>,
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(rename = "_limit")]
    limit: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdeaResponse {
    id: String,
    title: String,
    summary: String,
    description: String,
    tags: Vec<String>,
    owner: String,
    created_at: String,
}

impl From<Idea> for IdeaResponse {
    fn from(idea: Idea) -> Self {
        Self {
            id: idea.uuid,
            title: idea.title,
            summary: idea.summary,
            description: idea.description,
            tags: idea.tags,
            owner: idea.owner,
            created_at: idea.created_at,
        }
    }
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

// --- Helpers ---

/// Trim every tag and drop the empty ones, keeping order.
fn normalize_tags(tags: Option<TagsInput>) -> Vec<String> {
    let raw: Vec<String> = match tags {
        None => return Vec::new(),
        Some(TagsInput::List(list)) => list,
        Some(TagsInput::Text(text)) => text.split(',').map(str::to_string).collect(),
    };

    raw.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn required(value: Option<String>) -> Result<String, ApiError> {
    let value = value.unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::invalid_input(FIELDS_REQUIRED));
    }
    Ok(trimmed.to_string())
}

impl IdeaRequest {
    fn into_fields(self) -> Result<IdeaFields, ApiError> {
        Ok(IdeaFields {
            title: required(self.title)?,
            summary: required(self.summary)?,
            description: required(self.description)?,
            tags: normalize_tags(self.tags),
        })
    }
}

/// `_limit` must be a positive integer; anything else means no cap.
fn parse_limit(raw: Option<&str>) -> Option<u32> {
    raw?.trim().parse::<u32>().ok().filter(|&n| n > 0)
}

/// Resolve the `{id}` segment to a stored idea. Undecodable and malformed ids
/// are not found, like ids that do not exist.
async fn find_idea(
    db: &Database,
    id: Result<Path<String>, PathRejection>,
) -> Result<Idea, ApiError> {
    let Ok(Path(id)) = id else {
        return Err(ApiError::not_found(IDEA_NOT_FOUND));
    };
    require_uuid(&id, IDEA_NOT_FOUND)?;

    db.ideas()
        .get_by_uuid(&id)
        .await
        .db_err("Failed to get idea")?
        .ok_or_else(|| ApiError::not_found(IDEA_NOT_FOUND))
}

// --- Handlers ---

async fn list_ideas(
    State(state): State<IdeasState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // An unparseable query string (e.g. a repeated `_limit`) means no cap
    let limit = params
        .ok()
        .and_then(|Query(params)| parse_limit(params.limit.as_deref()));

    let ideas = state
        .db
        .ideas()
        .list(limit)
        .await
        .db_err("Failed to list ideas")?;

    let response: Vec<IdeaResponse> = ideas.into_iter().map(IdeaResponse::from).collect();
    Ok(Json(response))
}

async fn get_idea(
    State(state): State<IdeasState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let idea = find_idea(&state.db, id).await?;
    Ok(Json(IdeaResponse::from(idea)))
}

async fn create_idea(
    State(state): State<IdeasState>,
    Authenticated(user): Authenticated,
    payload: Result<Json<IdeaRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::invalid_input(FIELDS_REQUIRED))?;
    let fields = payload.into_fields()?;

    let idea = state
        .db
        .ideas()
        .create(&user.id, &fields)
        .await
        .db_err("Failed to create idea")?;

    info!(idea_id = %idea.uuid, user_id = %user.id, "Idea created");

    Ok((StatusCode::CREATED, Json(IdeaResponse::from(idea))))
}

async fn update_idea(
    State(state): State<IdeasState>,
    Authenticated(user): Authenticated,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<IdeaRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // Existence first, then ownership, then the body
    let idea = find_idea(&state.db, id).await?;

    if authorize(&user, &idea) == Access::Denied {
        return Err(ApiError::forbidden("Not authorized to update this idea"));
    }

    let Json(payload) = payload.map_err(|_| ApiError::invalid_input(FIELDS_REQUIRED))?;
    let fields = payload.into_fields()?;

    let updated = state
        .db
        .ideas()
        .update(&idea.uuid, &fields)
        .await
        .db_err("Failed to update idea")?
        .ok_or_else(|| ApiError::not_found(IDEA_NOT_FOUND))?;

    Ok(Json(IdeaResponse::from(updated)))
}

async fn delete_idea(
    State(state): State<IdeasState>,
    Authenticated(user): Authenticated,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let idea = find_idea(&state.db, id).await?;

    if authorize(&user, &idea) == Access::Denied {
        return Err(ApiError::forbidden("Not authorized to delete this idea"));
    }

    let deleted = state
        .db
        .ideas()
        .delete(&idea.uuid)
        .await
        .db_err("Failed to delete idea")?;

    if !deleted {
        return Err(ApiError::not_found(IDEA_NOT_FOUND));
    }

    info!(idea_id = %idea.uuid, user_id = %user.id, "Idea deleted");

    Ok(Json(MessageResponse {
        message: "Idea deleted successfully",
    }))
}
