//! Middleware for embedding the health endpoint and tracing requests.
//!
//! [`HealthLayer`] answers requests whose target is exactly `/health` (no query
//! string, no trailing slash) using the configured checks and passes everything
//! else to the wrapped service untouched. It can be applied with
//! `Router::layer` or around any tower service.
//!
//! [`request_id_layer`] generates a UUID v4 for each incoming request and
//! creates a tracing span that wraps the entire request lifecycle.

use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

use crate::check::CheckSet;
use crate::config::HEALTH_PATH;
use crate::routes::health::handle_health_request;

/// Build the health middleware for an existing request chain.
pub fn middleware(checks: CheckSet) -> HealthLayer {
    HealthLayer::new(checks)
}

/// Layer that intercepts `/health` before the inner service sees it.
#[derive(Clone, Debug, Default)]
pub struct HealthLayer {
    checks: CheckSet,
}

impl HealthLayer {
    pub fn new(checks: CheckSet) -> Self {
        Self { checks }
    }
}

impl<S> Layer<S> for HealthLayer {
    type Service = HealthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HealthService {
            inner,
            checks: self.checks.clone(),
        }
    }
}

/// Whole request target (path plus query) must equal `/health`.
fn is_health_target(uri: &http::Uri) -> bool {
    uri.path_and_query().map(|target| target.as_str()) == Some(HEALTH_PATH)
}

/// Service produced by [`HealthLayer`].
#[derive(Clone, Debug)]
pub struct HealthService<S> {
    inner: S,
    checks: CheckSet,
}

impl<S, B> Service<http::Request<B>> for HealthService<S>
where
    S: Service<http::Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: http::Request<B>) -> Self::Future {
        if is_health_target(request.uri()) {
            let checks = self.checks.clone();
            return Box::pin(async move {
                let status = handle_health_request(checks).await;
                Ok(status.into_response())
            });
        }

        // The ready service is taken and a fresh clone left in its place.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(inner.call(request))
    }
}

/// Middleware that generates a request ID and creates a request span.
///
/// This should be the outermost middleware layer so the span wraps
/// all request processing, including other middleware and handlers.
pub async fn request_id_layer(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        duration_ms = tracing::field::Empty,
    );

    let start = Instant::now();

    async move {
        let response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::Span::current().record("duration_ms", duration_ms);
        tracing::debug!(
            status = response.status().as_u16(),
            duration_ms,
            "Request completed"
        );

        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::check::Check;

    /// Inner service that answers 418 and counts how often it is reached.
    #[derive(Clone)]
    struct Teapot {
        hits: Arc<AtomicUsize>,
    }

    impl Service<http::Request<Body>> for Teapot {
        type Response = Response;
        type Error = Infallible;
        type Future = std::future::Ready<Result<Response, Infallible>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _request: http::Request<Body>) -> Self::Future {
            self.hits.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(StatusCode::IM_A_TEAPOT.into_response()))
        }
    }

    fn teapot(hits: Arc<AtomicUsize>) -> Teapot {
        Teapot { hits }
    }

    fn counting_check(result: bool, calls: Arc<AtomicUsize>) -> Check {
        Check::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            result
        })
    }

    fn get(uri: &str) -> http::Request<Body> {
        http::Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_path_is_intercepted() {
        let hits = Arc::new(AtomicUsize::new(0));
        let service = middleware(CheckSet::Unconfigured).layer(teapot(hits.clone()));

        let response = service.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_check_returns_503() {
        let hits = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let checks = CheckSet::new([counting_check(false, calls.clone())]);
        let service = middleware(checks).layer(teapot(hits.clone()));

        let response = service.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_paths_pass_through_without_evaluating() {
        let hits = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let checks = CheckSet::new([counting_check(false, calls.clone())]);
        let layer = middleware(checks);

        for uri in ["/other-path", "/health/", "/healthz", "/api/health", "/Health"] {
            let response = layer
                .layer(teapot(hits.clone()))
                .oneshot(get(uri))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::IM_A_TEAPOT, "uri {}", uri);
        }

        assert_eq!(hits.load(Ordering::SeqCst), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_health_with_query_string_passes_through() {
        let hits = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let checks = CheckSet::new([counting_check(false, calls.clone())]);
        let service = middleware(checks).layer(teapot(hits.clone()));

        let response = service.oneshot(get("/health?verbose=1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_is_health_target() {
        assert!(is_health_target(&"/health".parse().unwrap()));
        assert!(is_health_target(&"http://localhost:3000/health".parse().unwrap()));
        assert!(!is_health_target(&"/health?verbose=1".parse().unwrap()));
        assert!(!is_health_target(&"/health/".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_any_method_on_health_is_answered() {
        let hits = Arc::new(AtomicUsize::new(0));
        let service = middleware(CheckSet::Unconfigured).layer(teapot(hits.clone()));

        let request = http::Request::head("/health").body(Body::empty()).unwrap();
        let response = service.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
