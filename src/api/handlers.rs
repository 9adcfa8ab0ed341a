//! API Handlers
//!
//! HTTP request handlers for the demo service: a users resource whose list
//! is served through the response cache, and cache administration endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{CacheItem, KeyPattern};
use crate::error::{CacheError, Result};
use crate::facade::{Cache, Outcome};
use crate::models::{GetResponse, HealthResponse, SetRequest, User};

/// Key prefix under which the users list responses are cached.
pub const USERS_CACHE_PREFIX: &str = "user";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache facade
    pub cache: Cache,
    /// Demo users resource
    pub users: Arc<RwLock<Vec<User>>>,
}

impl AppState {
    /// Creates a new AppState around an initialized (or disabled) cache.
    pub fn new(cache: Cache) -> Self {
        Self {
            cache,
            users: Arc::new(RwLock::new(vec![
                User::new(1, "John Doe"),
                User::new(2, "Ba Hung"),
            ])),
        }
    }
}

/// Handler for GET /api/users
///
/// Wrapped by the response cache, so repeated calls are served from cache.
pub async fn list_users_handler(State(state): State<AppState>) -> Json<Vec<User>> {
    let users = state.users.read().await;
    Json(users.clone())
}

/// Handler for POST /api/users
///
/// Adds a user, then drops every cached users response.
pub async fn create_user_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<User>)> {
    let user = {
        let mut users = state.users.write().await;
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let user = User::new(id, format!("user_{id}"));
        users.push(user.clone());
        user
    };

    state
        .cache
        .remove_by_pattern(KeyPattern::literal(USERS_CACHE_PREFIX)?)
        .await?;
    info!(id = user.id, "User created, users cache invalidated");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Handler for PUT /cache/set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<Outcome>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let outcome = state.cache.set(&req.key, &req.value, req.ttl()).await?;
    Ok(Json(outcome))
}

/// Handler for GET /cache/get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key).await? {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for GET /cache/entries
///
/// Responds with `null` while the cache is inactive.
pub async fn entries_handler(State(state): State<AppState>) -> Result<Json<Option<Vec<CacheItem>>>> {
    Ok(Json(state.cache.get_all().await?))
}

/// Handler for DELETE /cache/del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Outcome>> {
    Ok(Json(state.cache.remove(&key).await?))
}

/// Handler for DELETE /cache/pattern/:pattern
pub async fn remove_pattern_handler(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> Result<Json<Outcome>> {
    Ok(Json(state.cache.remove_by_pattern(pattern).await?))
}

/// Handler for DELETE /cache/clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<Outcome>> {
    Ok(Json(state.cache.clear().await?))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.is_active().await))
}
