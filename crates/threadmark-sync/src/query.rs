use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use threadmark_core::{Thread, ThreadKey, ThreadRegistry};
use threadmark_slack::ChatPlatform;

/// Which of a user's open threads to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadScope {
    /// Only threads renamed with a rename command
    #[default]
    Renamed,
    AllOpen,
}

/// One row of a "my threads" answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadListing {
    pub key: ThreadKey,
    pub name: String,
    /// `None` when the permalink could not be resolved
    pub permalink: Option<String>,
    pub created_at: DateTime<Utc>,
    pub age: String,
}

impl ThreadListing {
    pub fn channel(&self) -> &str {
        &self.key.channel
    }
}

/// Read-only lookups behind the `/mythreads` command
pub struct ThreadQuery {
    platform: Arc<dyn ChatPlatform>,
    registry: ThreadRegistry,
}

impl ThreadQuery {
    pub fn new(platform: Arc<dyn ChatPlatform>, registry: ThreadRegistry) -> Self {
        Self { platform, registry }
    }

    pub async fn list(&self, user_id: &str, scope: ThreadScope, now: DateTime<Utc>) -> Vec<ThreadListing> {
        match scope {
            ThreadScope::Renamed => self.open_renamed_threads(user_id, now).await,
            ThreadScope::AllOpen => self.open_threads(user_id, now).await,
        }
    }

    /// Open, manually renamed threads of a user, newest first
    pub async fn open_renamed_threads(&self, user_id: &str, now: DateTime<Utc>) -> Vec<ThreadListing> {
        let threads = self.registry.query_open_renamed_threads_for_user(user_id).await;
        self.to_listings(threads, now).await
    }

    /// Every open thread of a user, newest first
    pub async fn open_threads(&self, user_id: &str, now: DateTime<Utc>) -> Vec<ThreadListing> {
        let threads = self.registry.query_open_threads_for_user(user_id).await;
        self.to_listings(threads, now).await
    }

    async fn to_listings(&self, mut threads: Vec<Thread>, now: DateTime<Utc>) -> Vec<ThreadListing> {
        threads.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.key.cmp(&b.key)));

        let permalinks = join_all(threads.iter().map(|thread| self.permalink(thread))).await;

        threads
            .into_iter()
            .zip(permalinks)
            .map(|(thread, permalink)| ThreadListing {
                age: format_age(thread.created_at, now),
                created_at: thread.created_at,
                name: thread.name,
                key: thread.key,
                permalink,
            })
            .collect()
    }

    async fn permalink(&self, thread: &Thread) -> Option<String> {
        match self
            .platform
            .resolve_permalink(thread.channel(), thread.root_ts())
            .await
        {
            Ok(link) => Some(link),
            Err(e) => {
                tracing::error!("[Query] Error fetching permalink for {}: {}", thread.key, e);
                None
            }
        }
    }
}

/// Coarse age of a thread: whole hours below a day, whole days after
pub fn format_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - created_at).num_seconds().max(0);
    let hours = elapsed / 3600;

    if hours < 24 {
        format!("{}h ago", hours)
    } else {
        format!("{}d ago", elapsed / 86_400)
    }
}
