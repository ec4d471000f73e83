// src/server/middleware.rs
//! Request logging for the inbound webhook server.

use crate::constants::DYNAMIC_WEBHOOK_PREFIX;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

/// Logs method, path, status and elapsed time of every request.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = loggable_path(request.uri().path());
    let host = request
        .headers()
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    log::info!(
        "method={} uri={} host={} status={} took={:?}",
        method,
        path,
        host,
        response.status().as_u16(),
        started.elapsed()
    );

    response
}

/// Dynamic webhook paths embed the destination's secret; keep it out of logs.
fn loggable_path(path: &str) -> String {
    match path.strip_prefix(DYNAMIC_WEBHOOK_PREFIX) {
        Some(rest) if !rest.is_empty() => format!("{}/...", DYNAMIC_WEBHOOK_PREFIX),
        _ => path.to_string(),
    }
}
