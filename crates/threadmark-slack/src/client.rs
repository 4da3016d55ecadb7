// Slack Web API client (HTTP direct, no SDK)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::{PlatformError, Result};
use crate::traits::ChatPlatform;
use crate::types::{Channel, CommandResponse, Message};

const SLACK_API_BASE: &str = "https://slack.com/api";
const CHANNEL_PAGE_LIMIT: u32 = 1000;

pub struct SlackClient {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChannelsPage {
    #[serde(default)]
    channels: Vec<Channel>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct MessagesPage {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct PermalinkResponse {
    permalink: String,
}

impl SlackClient {
    /// Create a client authenticated with a bot token (`xoxb-...`)
    pub fn new(bot_token: impl Into<String>) -> Result<Self> {
        let bot_token = bot_token.into();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bot_token))
                .map_err(|e| PlatformError::InvalidToken(e.to_string()))?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url: SLACK_API_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call a Web API method and decode its payload.
    ///
    /// Slack answers most failures with HTTP 200 and `"ok": false`, so the
    /// envelope is checked before decoding.
    async fn call<T: DeserializeOwned>(&self, method: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);

        let response = self.http_client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            return Err(PlatformError::Status {
                method: method.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;

        if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let error = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error")
                .to_string();
            return Err(PlatformError::Api {
                method: method.to_string(),
                error,
            });
        }

        serde_json::from_value(body).map_err(|source| PlatformError::Decode {
            method: method.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ChatPlatform for SlackClient {
    async fn list_channels(&self) -> Result<Vec<Channel>> {
        let mut channels = Vec::new();
        let mut cursor = String::new();

        loop {
            let mut query = vec![
                ("types", "public_channel,private_channel".to_string()),
                ("exclude_archived", "true".to_string()),
                ("limit", CHANNEL_PAGE_LIMIT.to_string()),
            ];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.clone()));
            }

            let page: ChannelsPage = self.call("conversations.list", &query).await?;
            channels.extend(
                page.channels
                    .into_iter()
                    .filter(|channel| channel.is_member && !channel.is_archived),
            );

            cursor = page
                .response_metadata
                .map(|meta| meta.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                break;
            }
        }

        Ok(channels)
    }

    async fn fetch_history(
        &self,
        channel: &str,
        oldest: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Message>> {
        let query = [
            ("channel", channel.to_string()),
            ("oldest", oldest.timestamp().to_string()),
            ("limit", limit.to_string()),
        ];
        let page: MessagesPage = self.call("conversations.history", &query).await?;
        Ok(page.messages)
    }

    async fn fetch_replies(&self, channel: &str, root_ts: &str, limit: u32) -> Result<Vec<Message>> {
        let query = [
            ("channel", channel.to_string()),
            ("ts", root_ts.to_string()),
            ("limit", limit.to_string()),
        ];
        let page: MessagesPage = self.call("conversations.replies", &query).await?;
        Ok(page.messages)
    }

    async fn resolve_permalink(&self, channel: &str, message_ts: &str) -> Result<String> {
        let query = [
            ("channel", channel.to_string()),
            ("message_ts", message_ts.to_string()),
        ];
        let response: PermalinkResponse = self.call("chat.getPermalink", &query).await?;
        Ok(response.permalink)
    }

    async fn respond(&self, response_url: &str, response: &CommandResponse) -> Result<()> {
        let reply = self.http_client.post(response_url).json(response).send().await?;

        let status = reply.status();
        if status.is_success() {
            tracing::debug!("Slash command response delivered: {}", status);
            Ok(())
        } else {
            let body = reply
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            Err(PlatformError::Status {
                method: "response_url".to_string(),
                status: status.as_u16(),
                body,
            })
        }
    }
}
