//! Response Caching Middleware
//!
//! Caches successful responses keyed by a fingerprint of method and URL.
//! Use with [`axum::middleware::from_fn_with_state`]:
//!
//! ```ignore
//! let users = cache.middleware(Some(Ttl::Seconds(600)), Some("user"));
//! let app = Router::new().route(
//!     "/api/users",
//!     get(list_users).layer(from_fn_with_state(users, cache_response)),
//! );
//! ```
//!
//! There is no invalidation trigger: after a mutation, callers remove the
//! affected entries with `remove_by_pattern(prefix)`.

use axum::{
    body::{to_bytes, Body},
    extract::{OriginalUri, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, error, warn};

use crate::cache::Ttl;
use crate::facade::{is_truthy, Cache};

// == Response Cache ==
/// Middleware state: the cache plus the TTL and key prefix for one route.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    cache: Cache,
    ttl: Option<Ttl>,
    prefix: Option<String>,
}

impl ResponseCache {
    pub fn new(cache: Cache, ttl: Option<Ttl>, prefix: Option<String>) -> Self {
        Self { cache, ttl, prefix }
    }

    /// Cache key for a request: the fingerprint, behind `prefix_` if set.
    pub fn key_for(&self, method: &Method, url: &str) -> String {
        let fingerprint = fingerprint(method.as_str(), url);
        match &self.prefix {
            Some(prefix) => format!("{prefix}_{fingerprint}"),
            None => fingerprint,
        }
    }
}

/// Hex SHA-256 of `method|url`.
pub fn fingerprint(method: &str, url: &str) -> String {
    let digest = Sha256::digest(format!("{method}|{url}").as_bytes());
    format!("{digest:x}")
}

// == Middleware ==
/// Serves a cached payload when one exists; otherwise runs the handler and
/// caches its successful body.
pub async fn cache_response(
    State(state): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    // Nested routers strip their mount path from the request URI
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.0.clone())
        .unwrap_or_else(|| request.uri().clone());
    let url = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let key = state.key_for(request.method(), &url);

    match state.cache.get(&key).await {
        Ok(Some(cached)) if is_truthy(&cached) => {
            debug!(key = %key, url = %url, "Serving cached response");
            return replay(cached);
        }
        Ok(_) => {}
        Err(err) => {
            error!(key = %key, error = %err, "Cache lookup failed");
            return err.into_response();
        }
    }

    let response = next.run(request).await;
    store_response(&state, &key, response).await
}

/// Buffers the response body, caches it if the response succeeded, and
/// returns an equivalent response.
async fn store_response(state: &ResponseCache, key: &str, response: Response) -> Response {
    if !response.status().is_success() {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(key, error = %err, "Failed to buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let is_json = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    match payload_from_body(&bytes, is_json) {
        Some(payload) => {
            // A failed write still sends the response, just uncached
            if let Err(err) = state.cache.set(key, &payload, state.ttl).await {
                warn!(key, error = %err, "Failed to cache response");
            }
        }
        None => debug!(key, "Response body is not text, skipping cache"),
    }

    Response::from_parts(parts, Body::from(bytes))
}

/// JSON bodies are cached as their parsed value, text bodies as a string.
fn payload_from_body(bytes: &[u8], is_json: bool) -> Option<Value> {
    if is_json {
        if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
            return Some(value);
        }
    }
    std::str::from_utf8(bytes)
        .ok()
        .map(|text| Value::String(text.to_string()))
}

/// Strings go back out as HTML text, anything else as JSON.
fn replay(cached: Value) -> Response {
    match cached {
        Value::String(text) => (
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            )],
            text,
        )
            .into_response(),
        other => Json(other).into_response(),
    }
}
