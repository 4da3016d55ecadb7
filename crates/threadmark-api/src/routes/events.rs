use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use threadmark_slack::{EventEnvelope, MessageEvent, SlackEvent};
use threadmark_sync::{EventOutcome, LiveReconciler};

use crate::state::AppState;

pub const RETRY_HEADER: &str = "x-slack-retry-num";

/// Slack Events API endpoint.
///
/// Answers the URL verification handshake and acknowledges every event
/// callback straight away; message events are reconciled in the background.
/// Redeliveries are dropped only when their `event_id` was already accepted.
pub async fn receive_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(envelope): Json<EventEnvelope>,
) -> Response {
    let retry = headers
        .get(RETRY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match envelope {
        EventEnvelope::UrlVerification { challenge } => {
            tracing::info!("Answering URL verification challenge");
            Json(json!({ "challenge": challenge })).into_response()
        }
        EventEnvelope::EventCallback {
            event: SlackEvent::Message(event),
            event_id,
        } => {
            if let Some(id) = &event_id {
                if !state.seen_events.first_delivery(id) {
                    tracing::debug!(event_id = %id, retry = ?retry, "Skipping duplicate delivery");
                    return StatusCode::OK.into_response();
                }
            }
            tracing::debug!(event_id = ?event_id, retry = ?retry, "Received message event");
            spawn_reconcile(state.live.clone(), event);
            StatusCode::OK.into_response()
        }
        EventEnvelope::EventCallback { .. } | EventEnvelope::Unsupported => {
            StatusCode::OK.into_response()
        }
    }
}

fn spawn_reconcile(live: LiveReconciler, event: MessageEvent) {
    tokio::spawn(async move {
        // Outcomes are logged by the reconciler
        if let EventOutcome::RebuildFailed(_) = live.handle(&event).await {
            tracing::debug!("Event dropped until the thread's next reply");
        }
    });
}
