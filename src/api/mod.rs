//! API Module
//!
//! HTTP handlers and routing for the demo service.
//!
//! # Endpoints
//! - `GET|POST /api/users` - Users resource, listing served through the response cache
//! - `/cache/*` - Cache administration (set, get, entries, del, pattern, clear)
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_router, USERS_CACHE_TTL};
