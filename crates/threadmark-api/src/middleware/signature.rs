//! Slack request signing.
//!
//! Slack signs every request with `v0=HMAC-SHA256(secret, "v0:{ts}:{body}")`
//! in `X-Slack-Signature` and sends `{ts}` in `X-Slack-Request-Timestamp`.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Requests older than this are treated as replays
pub const MAX_REQUEST_AGE_SECS: i64 = 60 * 5;

const MAX_BODY_BYTES: usize = 1024 * 1024;
const VERSION: &str = "v0";

/// Compute the `v0=...` signature Slack would send for `body`
pub fn compute_signature(secret: &str, timestamp: &str, body: &[u8]) -> ApiResult<String> {
    let mac = signed_mac(secret, timestamp, body)?;
    Ok(format!("{}={}", VERSION, hex::encode(mac.finalize().into_bytes())))
}

/// Check a request signature in constant time
pub fn verify_signature(
    secret: &str,
    timestamp: &str,
    signature: &str,
    body: &[u8],
    now_secs: i64,
) -> ApiResult<()> {
    let sent_at: i64 = timestamp
        .parse()
        .map_err(|_| ApiError::Unauthorized("malformed timestamp".to_string()))?;
    if (now_secs - sent_at).abs() > MAX_REQUEST_AGE_SECS {
        return Err(ApiError::Unauthorized("stale timestamp".to_string()));
    }

    let digest = signature
        .strip_prefix("v0=")
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
        .ok_or_else(|| ApiError::Unauthorized("malformed signature".to_string()))?;

    signed_mac(secret, timestamp, body)?
        .verify_slice(&digest)
        .map_err(|_| ApiError::Unauthorized("signature mismatch".to_string()))
}

fn signed_mac(secret: &str, timestamp: &str, body: &[u8]) -> ApiResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ApiError::Unauthorized(format!("unusable signing secret: {}", e)))?;
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(mac)
}

/// Reject Slack requests whose signature does not match the signing secret.
///
/// The body is buffered for hashing and handed on unchanged.
pub async fn verify_slack_signature(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let (parts, body) = request.into_parts();

    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", name)))
    };
    let timestamp = header(TIMESTAMP_HEADER)?;
    let signature = header(SIGNATURE_HEADER)?;

    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read body: {}", e)))?;

    verify_signature(
        &state.config.slack_signing_secret,
        &timestamp,
        &signature,
        &bytes,
        chrono::Utc::now().timestamp(),
    )?;

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}
