use axum::{extract::State, http::StatusCode, Form};
use std::sync::Arc;
use threadmark_slack::{CommandResponse, SlashCommand};
use threadmark_sync::{ThreadListing, ThreadScope};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

pub const MY_THREADS_COMMAND: &str = "/mythreads";

const FETCH_FAILED: &str = "An error occurred while fetching your threads.";

/// Slash command endpoint.
///
/// The command is acknowledged with an empty 200 and the listing is posted
/// to the command's `response_url` once permalinks are resolved.
pub async fn handle_command(
    State(state): State<Arc<AppState>>,
    Form(command): Form<SlashCommand>,
) -> ApiResult<StatusCode> {
    if command.command != MY_THREADS_COMMAND {
        return Err(ApiError::BadRequest(format!(
            "Unknown command: {}",
            command.command
        )));
    }

    let scope = parse_scope(&command.text);
    tracing::info!(user = %command.user_id, scope = ?scope, "Handling {}", MY_THREADS_COMMAND);

    tokio::spawn(respond_with_threads(state, command, scope));
    Ok(StatusCode::OK)
}

/// `/mythreads all` lists every open thread, anything else only renamed ones
pub fn parse_scope(text: &str) -> ThreadScope {
    if text.trim().eq_ignore_ascii_case("all") {
        ThreadScope::AllOpen
    } else {
        ThreadScope::Renamed
    }
}

async fn respond_with_threads(state: Arc<AppState>, command: SlashCommand, scope: ThreadScope) {
    let query = Arc::clone(&state.query);
    let user_id = command.user_id.clone();
    let listing = tokio::spawn(async move {
        query.list(&user_id, scope, chrono::Utc::now()).await
    });

    let text = match listing.await {
        Ok(listings) => render_listings(&listings, scope),
        Err(e) => {
            tracing::error!("Thread listing for {} failed: {}", command.user_id, e);
            FETCH_FAILED.to_string()
        }
    };

    let response = CommandResponse::ephemeral(text);
    if let Err(e) = state.platform.respond(&command.response_url, &response).await {
        tracing::error!("Failed to deliver {} response: {}", MY_THREADS_COMMAND, e);
    }
}

/// Render listings as Slack mrkdwn
pub fn render_listings(listings: &[ThreadListing], scope: ThreadScope) -> String {
    if listings.is_empty() {
        return match scope {
            ThreadScope::Renamed => {
                "You don't have any manually renamed open threads at the moment.".to_string()
            }
            ThreadScope::AllOpen => "You don't have any open threads at the moment.".to_string(),
        };
    }

    let mut text = format!("You have *{} open thread(s)*:\n\n", listings.len());
    for listing in listings {
        let line = match &listing.permalink {
            Some(link) => format!(
                "• <{}|{}> in <#{}> ({})",
                link,
                listing.name,
                listing.channel(),
                listing.age
            ),
            None => format!(
                "• {} in <#{}> ({}) (link unavailable)",
                listing.name,
                listing.channel(),
                listing.age
            ),
        };
        text.push_str(&line);
        text.push('\n');
    }
    text.trim_end().to_string()
}
