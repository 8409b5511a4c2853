//! Request/response logging middleware with key redaction

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::info;

/// Logs each request and its outcome, including conditional headers
///
/// Runs inside `TraceLayer`'s span and does not open one of its own.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let route = matched_route(&request);
    let headers_log = loggable_headers(request.headers());

    info!(
        method = %method,
        route = %route,
        uri = %request.uri(),
        headers = %headers_log,
        "Incoming request"
    );

    let response = next.run(request).await;

    let etag = response
        .headers()
        .get(header::ETAG)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    info!(
        method = %method,
        route = %route,
        status = response.status().as_u16(),
        etag = %etag,
        duration_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}

pub(crate) fn matched_route(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

fn loggable_headers(headers: &HeaderMap) -> String {
    let mut parts = Vec::new();

    for (name, value) in headers {
        let name = name.as_str();

        if !should_log_header(name) {
            continue;
        }

        let value = if is_sensitive_header(name) {
            "[REDACTED]"
        } else {
            value.to_str().unwrap_or("[invalid]")
        };

        parts.push(format!("{}={}", name, value));
    }

    parts.join(", ")
}

fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name,
        "authorization" | "x-user-key" | "cookie" | "proxy-authorization"
    )
}

fn should_log_header(name: &str) -> bool {
    matches!(
        name,
        "content-type"
            | "content-length"
            | "accept"
            | "user-agent"
            | "if-none-match"
            | "if-match"
            | "x-request-id"
            | "x-forwarded-for"
            | "authorization"
            | "x-user-key"
    )
}
