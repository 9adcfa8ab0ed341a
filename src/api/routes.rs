//! API Routes
//!
//! Configures the Axum router for the demo service.

use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, create_user_handler, delete_handler, entries_handler, get_handler,
    health_handler, list_users_handler, remove_pattern_handler, set_handler, AppState,
    USERS_CACHE_PREFIX,
};
use crate::cache::Ttl;
use crate::middleware::cache_response;

/// How long a cached users list stays valid.
pub const USERS_CACHE_TTL: Ttl = Ttl::Seconds(846_000);

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/users` - List users (response cached under the `user` prefix)
/// - `POST /api/users` - Add a user and invalidate the cached lists
/// - `PUT /cache/set` - Store a key-value pair
/// - `GET /cache/get/:key` - Retrieve a value by key
/// - `GET /cache/entries` - List all live entries
/// - `DELETE /cache/del/:key` - Delete a key
/// - `DELETE /cache/pattern/:pattern` - Delete every key matching a regex
/// - `DELETE /cache/clear` - Drop every entry
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let response_cache = state
        .cache
        .middleware(Some(USERS_CACHE_TTL), Some(USERS_CACHE_PREFIX));

    let users = get(list_users_handler)
        .layer(middleware::from_fn_with_state(response_cache, cache_response))
        .post(create_user_handler);

    Router::new()
        .route("/api/users", users)
        .route("/cache/set", put(set_handler))
        .route("/cache/get/:key", get(get_handler))
        .route("/cache/entries", get(entries_handler))
        .route("/cache/del/:key", delete(delete_handler))
        .route("/cache/pattern/:pattern", delete(remove_pattern_handler))
        .route("/cache/clear", delete(clear_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
