//! Request logging middleware

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{info, info_span, Span};

use crate::infrastructure::observability::record_http_request;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const UNMATCHED_ROUTE: &str = "unmatched";

/// Logs each request and records its metrics. `TraceLayer` owns the span,
/// so this only emits events.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri_path = request.uri().path().to_string();
    let route = extract_route(&request);
    let request_id = extract_request_id(&request);

    info!(
        method = %method,
        path = %uri_path,
        route = %route,
        request_id = %request_id,
        "Incoming request"
    );

    let mut response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    info!(
        method = %method,
        route = %route,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    record_http_request(method.as_str(), &route, status.as_u16(), duration);

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Route template for metric labels. Unmatched requests share one label so
/// arbitrary 404 paths cannot grow the series set.
fn extract_route(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// Span for `TraceLayer`. Records the path only; query strings stay out of logs.
pub fn request_span(request: &Request<Body>) -> Span {
    info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

fn extract_request_id(request: &Request<Body>) -> String {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
