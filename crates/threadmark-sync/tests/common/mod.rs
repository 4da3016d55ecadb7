#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use threadmark_slack::{Channel, ChatPlatform, CommandResponse, Message, PlatformError, Result};
use tokio::sync::Barrier;

/// In-memory stand-in for Slack
#[derive(Default)]
pub struct FakePlatform {
    channels: Vec<Channel>,
    fail_channels: bool,
    history: HashMap<String, Vec<Message>>,
    failing_history: HashSet<String>,
    replies: Mutex<HashMap<(String, String), Vec<Message>>>,
    failing_replies: HashSet<(String, String)>,
    failing_permalinks: HashSet<String>,
    replies_barrier: Option<Arc<Barrier>>,
    pub replies_calls: AtomicUsize,
    pub history_oldest: Mutex<Vec<DateTime<Utc>>>,
}

fn failure(method: &str) -> PlatformError {
    PlatformError::Api {
        method: method.to_string(),
        error: "fake_failure".to_string(),
    }
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(mut self, id: &str) -> Self {
        self.channels.push(Channel {
            id: id.to_string(),
            name: format!("chan-{}", id),
            is_member: true,
            is_archived: false,
        });
        self
    }

    pub fn fail_channels(mut self) -> Self {
        self.fail_channels = true;
        self
    }

    pub fn history(mut self, channel: &str, messages: Vec<Message>) -> Self {
        self.history.insert(channel.to_string(), messages);
        self
    }

    pub fn fail_history(mut self, channel: &str) -> Self {
        self.failing_history.insert(channel.to_string());
        self
    }

    pub fn replies(self, channel: &str, root_ts: &str, messages: Vec<Message>) -> Self {
        self.set_replies(channel, root_ts, messages);
        self
    }

    pub fn fail_replies(mut self, channel: &str, root_ts: &str) -> Self {
        self.failing_replies
            .insert((channel.to_string(), root_ts.to_string()));
        self
    }

    pub fn fail_permalink(mut self, root_ts: &str) -> Self {
        self.failing_permalinks.insert(root_ts.to_string());
        self
    }

    /// Hold every reply fetch until `parties` fetches are waiting
    pub fn with_replies_barrier(mut self, parties: usize) -> Self {
        self.replies_barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Replace the reply list of a thread, e.g. after a new message was posted
    pub fn set_replies(&self, channel: &str, root_ts: &str, messages: Vec<Message>) {
        self.replies
            .lock()
            .unwrap()
            .insert((channel.to_string(), root_ts.to_string()), messages);
    }

    pub fn replies_call_count(&self) -> usize {
        self.replies_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn list_channels(&self) -> Result<Vec<Channel>> {
        if self.fail_channels {
            return Err(failure("conversations.list"));
        }
        Ok(self.channels.clone())
    }

    async fn fetch_history(&self, channel: &str, oldest: DateTime<Utc>, _limit: u32) -> Result<Vec<Message>> {
        self.history_oldest.lock().unwrap().push(oldest);
        if self.failing_history.contains(channel) {
            return Err(failure("conversations.history"));
        }
        Ok(self.history.get(channel).cloned().unwrap_or_default())
    }

    async fn fetch_replies(&self, channel: &str, root_ts: &str, _limit: u32) -> Result<Vec<Message>> {
        self.replies_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.replies_barrier {
            barrier.wait().await;
        }

        let key = (channel.to_string(), root_ts.to_string());
        if self.failing_replies.contains(&key) {
            return Err(failure("conversations.replies"));
        }
        Ok(self.replies.lock().unwrap().get(&key).cloned().unwrap_or_default())
    }

    async fn resolve_permalink(&self, channel: &str, message_ts: &str) -> Result<String> {
        if self.failing_permalinks.contains(message_ts) {
            return Err(failure("chat.getPermalink"));
        }
        Ok(format!(
            "https://example.slack.com/archives/{}/p{}",
            channel,
            message_ts.replace('.', "")
        ))
    }

    async fn respond(&self, _response_url: &str, _response: &CommandResponse) -> Result<()> {
        Ok(())
    }
}

pub fn msg(ts: &str, user: &str, text: &str) -> Message {
    Message::new(ts, user, text)
}

pub fn root(ts: &str, user: &str, text: &str, reply_count: u32) -> Message {
    Message::new(ts, user, text).with_reply_count(reply_count)
}
