use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use threadmark_core::naming::extract_rename_command;
use threadmark_core::{Thread, ThreadKey, ThreadLookup, ThreadRegistry, ThreadUpdate};
use threadmark_slack::{ChatPlatform, MessageEvent};

use crate::reconstruct::reconstruct_thread;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Edits, deletions, bot and system messages
    Subtype(String),
    /// Missing channel, user or timestamp
    Malformed,
    /// A message that is not (yet) part of a thread
    RootMessage,
}

/// A message posted inside a thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub key: ThreadKey,
    pub ts: String,
    pub user: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventClass {
    Ignored(IgnoreReason),
    Reply(Reply),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Ignored(IgnoreReason),
    /// Reply merged into a known thread
    Updated(Thread),
    /// Reply merged into a known thread and renamed it
    Renamed(Thread),
    /// Unknown thread rebuilt from a fresh fetch of its replies
    Rebuilt(Thread),
    /// Unknown thread whose reply fetch came back empty
    RebuildEmpty,
    RebuildFailed(String),
}

/// Applies the live message stream to the registry.
///
/// A reply to a known thread is merged incrementally. A reply to an unknown
/// thread moves that thread through unknown -> rebuilding -> known: all of its
/// replies are fetched and the whole record is rebuilt. Two rebuilds of the
/// same thread may run at once; both derive the full state from the platform
/// so they converge, and the overlap is only logged.
#[derive(Clone)]
pub struct LiveReconciler {
    platform: Arc<dyn ChatPlatform>,
    registry: ThreadRegistry,
    replies_limit: u32,
    rebuilding: Arc<Mutex<HashMap<ThreadKey, usize>>>,
}

impl LiveReconciler {
    pub fn new(platform: Arc<dyn ChatPlatform>, registry: ThreadRegistry, replies_limit: u32) -> Self {
        Self {
            platform,
            registry,
            replies_limit,
            rebuilding: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn classify(event: &MessageEvent) -> EventClass {
        if let Some(subtype) = &event.subtype {
            return EventClass::Ignored(IgnoreReason::Subtype(subtype.clone()));
        }

        let (Some(channel), Some(user), Some(ts)) = (&event.channel, &event.user, &event.ts) else {
            return EventClass::Ignored(IgnoreReason::Malformed);
        };

        match &event.thread_ts {
            Some(thread_ts) if thread_ts != ts => EventClass::Reply(Reply {
                key: ThreadKey::new(channel.clone(), thread_ts.clone()),
                ts: ts.clone(),
                user: user.clone(),
                text: event.text.clone().unwrap_or_default(),
            }),
            _ => EventClass::Ignored(IgnoreReason::RootMessage),
        }
    }

    pub async fn handle(&self, event: &MessageEvent) -> EventOutcome {
        self.handle_at(event, Utc::now()).await
    }

    /// Handle one event, using `now` as the creation time of rebuilt threads
    pub async fn handle_at(&self, event: &MessageEvent, now: DateTime<Utc>) -> EventOutcome {
        let reply = match Self::classify(event) {
            EventClass::Reply(reply) => reply,
            EventClass::Ignored(reason) => {
                tracing::debug!("[Live] Event ignored: {:?}", reason);
                return EventOutcome::Ignored(reason);
            }
        };

        match self.registry.lookup(&reply.key).await {
            ThreadLookup::Known(_) => self.apply_reply(reply, now).await,
            ThreadLookup::Unknown => self.rebuild(reply.key, now).await,
        }
    }

    /// True while at least one rebuild of `key` is in flight
    pub fn is_rebuilding(&self, key: &ThreadKey) -> bool {
        self.lock_rebuilding().contains_key(key)
    }

    async fn apply_reply(&self, reply: Reply, now: DateTime<Utc>) -> EventOutcome {
        // Only this message can rename; history was already applied
        let renamed = extract_rename_command(&reply.text, self.registry.rules());

        let update = match &renamed {
            Some(name) => ThreadUpdate::new(name.clone(), reply.text, now).renamed(true),
            None => ThreadUpdate::new(String::new(), reply.text, now),
        }
        .participant(reply.user);

        let thread = self.registry.upsert(reply.key, update).await;

        if renamed.is_some() {
            tracing::info!("[Live] Thread renamed to \"{}\": {}", thread.name, thread.key);
            EventOutcome::Renamed(thread)
        } else {
            tracing::debug!("[Live] Thread updated: {}", thread.key);
            EventOutcome::Updated(thread)
        }
    }

    async fn rebuild(&self, key: ThreadKey, now: DateTime<Utc>) -> EventOutcome {
        tracing::info!("[Live] Unknown thread, rebuilding: {}", key);
        let _guard = RebuildGuard::enter(Arc::clone(&self.rebuilding), key.clone());

        let replies = match self
            .platform
            .fetch_replies(&key.channel, &key.root_ts, self.replies_limit)
            .await
        {
            Ok(replies) => replies,
            Err(e) => {
                tracing::error!("[Live] Error rebuilding thread {}: {}", key, e);
                return EventOutcome::RebuildFailed(e.to_string());
            }
        };

        match reconstruct_thread(&replies, self.registry.rules(), now) {
            Some(update) => {
                let thread = self.registry.upsert(key, update).await;
                tracing::info!("[Live] Thread rebuilt: {}", thread.key);
                EventOutcome::Rebuilt(thread)
            }
            None => {
                tracing::warn!("[Live] Unable to fetch thread messages for {}", key);
                EventOutcome::RebuildEmpty
            }
        }
    }

    fn lock_rebuilding(&self) -> std::sync::MutexGuard<'_, HashMap<ThreadKey, usize>> {
        self.rebuilding.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Marks a thread as rebuilding for as long as it is alive
struct RebuildGuard {
    rebuilding: Arc<Mutex<HashMap<ThreadKey, usize>>>,
    key: ThreadKey,
}

impl RebuildGuard {
    fn enter(rebuilding: Arc<Mutex<HashMap<ThreadKey, usize>>>, key: ThreadKey) -> Self {
        {
            let mut in_flight = rebuilding.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let count = in_flight.entry(key.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                tracing::debug!("[Live] Concurrent rebuild of {} ({} in flight)", key, count);
            }
        }
        Self { rebuilding, key }
    }
}

impl Drop for RebuildGuard {
    fn drop(&mut self) {
        let mut in_flight = self
            .rebuilding
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(count) = in_flight.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                in_flight.remove(&self.key);
            }
        }
    }
}
