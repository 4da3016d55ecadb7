use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    config::Config,
    middleware::{logging, signature},
    routes::{commands, events, health},
    state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    // Everything Slack posts must carry a valid signature
    let slack_routes = Router::new()
        .route("/slack/events", post(events::receive_event))
        .route("/slack/commands", post(commands::handle_command))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            signature::verify_slack_signature,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(slack_routes)
        .layer(middleware::from_fn(logging::log_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the startup backfill in the background.
///
/// The server starts answering immediately; events for threads the scan has
/// not reached yet are rebuilt on demand by the live reconciler.
pub fn spawn_backfill(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let report = state.backfill().run().await;
        if report.channels_failed > 0 || report.threads_failed > 0 {
            tracing::warn!("Backfill finished with partial results: {:?}", report);
        }
    })
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `logging.level`; `logging.format = "json"` switches to
/// one JSON object per line for log shipping.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(filter);
    if config.logging.format.eq_ignore_ascii_case("json") {
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty().with_target(false))
            .init();
    }
}
