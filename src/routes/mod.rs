//! HTTP routes for the standalone server.
//!
//! Only `GET /health` is registered here. Request tracing is enabled via
//! middleware that generates a unique request ID for each incoming request.

pub mod health;

use axum::{middleware, routing::get, Router};

use crate::check::CheckSet;
use crate::config::HEALTH_PATH;
use crate::middleware::request_id_layer;

/// Creates the router answering `GET /health` with the given checks.
pub fn create_router(checks: CheckSet) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health::health))
        .with_state(checks)
}

/// Wraps a router with the request ID span so every log line in a request
/// carries its `request_id`.
pub fn with_request_tracing(router: Router) -> Router {
    router.layer(middleware::from_fn(request_id_layer))
}
