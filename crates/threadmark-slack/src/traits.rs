use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{Channel, CommandResponse, Message};

/// Everything threadmark needs from the chat platform.
///
/// Implemented by [`crate::SlackClient`]; tests provide in-memory fakes.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Non-archived channels the bot is a member of
    async fn list_channels(&self) -> Result<Vec<Channel>>;

    /// Channel messages posted at or after `oldest`, newest first
    async fn fetch_history(
        &self,
        channel: &str,
        oldest: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Message>>;

    /// The root message followed by its replies, oldest to newest
    async fn fetch_replies(&self, channel: &str, root_ts: &str, limit: u32) -> Result<Vec<Message>>;

    async fn resolve_permalink(&self, channel: &str, message_ts: &str) -> Result<String>;

    /// Deliver a slash command response to its `response_url`
    async fn respond(&self, response_url: &str, response: &CommandResponse) -> Result<()>;
}
