use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::routes::events::RETRY_HEADER;

/// One log line per request, keyed by the matched route
pub async fn log_request(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let slack_retry = req
        .headers()
        .get(RETRY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let started = Instant::now();

    let response = next.run(req).await;
    let status = response.status();

    if status.is_success() {
        tracing::info!(
            route = %route,
            status = status.as_u16(),
            slack_retry = ?slack_retry,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Handled request"
        );
    } else {
        tracing::warn!(
            route = %route,
            status = status.as_u16(),
            slack_retry = ?slack_retry,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request rejected"
        );
    }

    response
}
