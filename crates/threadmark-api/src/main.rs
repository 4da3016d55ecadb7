use std::sync::Arc;

use threadmark_api::{
    config::Config,
    startup::{build_router, init_logging, spawn_backfill},
    state::AppState,
};
use threadmark_slack::{ChatPlatform, SlackClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Missing Slack credentials are the only fatal startup error
    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting threadmark");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    let platform: Arc<dyn ChatPlatform> = Arc::new(
        SlackClient::new(config.slack_bot_token.clone())?.with_base_url(&config.slack.api_base),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, platform));
    let app = build_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    spawn_backfill(state);

    axum::serve(listener, app).await?;

    Ok(())
}
