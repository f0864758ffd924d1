//! HTTP-level middleware (cross-cutting concerns).
//!
//! Responsibility:
//! - Request-Id generation + propagation (x-request-id)
//! - one tracing span per request, carrying method, route template,
//!   request id, and the final status code
//! - global timeout and request body limit
//!
//! The span is opened before authorization runs and closed when the span
//! guard drops, so close-exactly-once holds on every path: allow, deny,
//! timeout, client disconnect, panic. The correlation header is
//! propagated to the response outside the error-handling layer, so deny
//! and timeout responses carry it too.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::extract::{DefaultBodyLimit, MatchedPath};
use axum::http::{Request, StatusCode, header::HeaderName};
use axum::response::Response;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Apply HTTP-level middleware to the given Router.
///
/// Defaults:
/// - Request-Id header: `x-request-id`
/// - Body limit: 1 MiB
/// - Timeout: 30 seconds
pub fn apply(router: Router) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        // Assign a request id first so the span and the response both see it.
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span)
                .on_response(record_response),
        )
        // Convert timeout errors into responses so the service is Infallible
        // (and the trace layer records their status like any other).
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        // Bound request time (protects against hanging upstreams / slow clients).
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        // Limit request body size (protects against accidental/hostile large payloads).
        .layer(DefaultBodyLimit::max(1024 * 1024));

    router.layer(layers)
}

/// One span per request. The route template keeps span cardinality
/// bounded; the raw path only appears when routing found no template.
fn make_span(req: &Request<Body>) -> tracing::Span {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or_else(|| req.uri().path());

    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %req.method(),
        route,
        request_id,
        status = Empty,
    )
}

fn record_response(response: &Response, latency: Duration, span: &tracing::Span) {
    span.record("status", response.status().as_u16() as u64);
    tracing::debug!(
        parent: span,
        status = response.status().as_u16(),
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );
}
