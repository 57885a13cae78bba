//! Health check endpoint.
//!
//! Runs the configured [`CheckSet`] and maps the aggregate to a bare status code:
//! 200 when every check passes (or none are configured), 503 otherwise. No body
//! is written. Used by Kubernetes, ECS, systemd, and load balancers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::check::{self, CheckSet};

/// Outcome of a health request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(self) -> bool {
        self == HealthStatus::Healthy
    }

    pub fn status_code(self) -> StatusCode {
        match self {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<bool> for HealthStatus {
    fn from(healthy: bool) -> Self {
        if healthy {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }
}

impl IntoResponse for HealthStatus {
    fn into_response(self) -> Response {
        self.status_code().into_response()
    }
}

/// Evaluate `checks` and produce the status to send.
///
/// Checks may block (a database ping, say), so evaluation runs on the blocking
/// pool. If that task cannot complete the request is reported unhealthy.
pub async fn handle_health_request(checks: CheckSet) -> HealthStatus {
    let healthy = match tokio::task::spawn_blocking(move || check::evaluate(&checks)).await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::error!(error = %e, "Health evaluation task failed");
            false
        }
    };
    HealthStatus::from(healthy)
}

/// Axum handler for `GET /health`.
pub async fn health(State(checks): State<CheckSet>) -> HealthStatus {
    handle_health_request(checks).await
}
