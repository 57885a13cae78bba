//! Health Check Drop-in
//!
//! Adds a `/health` endpoint to a service. The endpoint runs zero or more
//! caller-supplied checks, ANDs their results, and answers 200 when healthy or
//! 503 when not. No body is written.
//!
//! Two ways to mount it:
//! - [`init`] starts a standalone server (port from the `port` environment
//!   variable, default 3000) and returns a [`ServerHandle`].
//! - [`middleware()`] returns a tower layer that answers `/health` inside an
//!   existing router and passes every other request through.
//!
//! ```no_run
//! use health_dropin::{middleware, Check, CheckSet};
//! use axum::{routing::get, Router};
//!
//! let checks = CheckSet::new([Check::named("always", || true)]);
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .fallback(|| async { "not found" })
//!     .layer(middleware(checks));
//! ```

pub mod check;
pub mod config;
pub mod http;
pub mod middleware;
pub mod routes;

pub use check::{evaluate, Check, CheckSet};
pub use http::{init, ServerBuilder, ServerError, ServerHandle};
pub use middleware::{middleware, HealthLayer, HealthService};
pub use routes::health::{handle_health_request, HealthStatus};
