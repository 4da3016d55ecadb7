use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{Thread, ThreadKey, ThreadUpdate};
use crate::rules::ThreadRules;

/// Result of looking a thread up before deciding how to apply a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadLookup {
    Known(Thread),
    Unknown,
}

/// In-memory registry of every tracked thread.
///
/// Cloning is cheap and every clone shares the same map. Each write holds the
/// lock for the whole read-modify-write, so updates to one key never
/// interleave.
#[derive(Clone)]
pub struct ThreadRegistry {
    threads: Arc<RwLock<HashMap<ThreadKey, Thread>>>,
    rules: Arc<ThreadRules>,
}

impl ThreadRegistry {
    pub fn new(rules: ThreadRules) -> Self {
        Self {
            threads: Arc::new(RwLock::new(HashMap::new())),
            rules: Arc::new(rules),
        }
    }

    pub fn rules(&self) -> &ThreadRules {
        &self.rules
    }

    /// Create or update the record for `key` and return the result
    pub async fn upsert(&self, key: ThreadKey, update: ThreadUpdate) -> Thread {
        let mut threads = self.threads.write().await;

        match threads.get_mut(&key) {
            Some(existing) => {
                existing.merge(update, &self.rules);
                existing.clone()
            }
            None => {
                let thread = Thread::from_update(key.clone(), update, &self.rules);
                tracing::debug!("Registry created thread {}", key);
                threads.insert(key, thread.clone());
                thread
            }
        }
    }

    pub async fn get(&self, key: &ThreadKey) -> Option<Thread> {
        self.threads.read().await.get(key).cloned()
    }

    pub async fn lookup(&self, key: &ThreadKey) -> ThreadLookup {
        match self.get(key).await {
            Some(thread) => ThreadLookup::Known(thread),
            None => ThreadLookup::Unknown,
        }
    }

    pub async fn contains(&self, key: &ThreadKey) -> bool {
        self.threads.read().await.contains_key(key)
    }

    /// Open threads the user has posted in, in no particular order
    pub async fn query_open_threads_for_user(&self, user_id: &str) -> Vec<Thread> {
        self.filter(|thread| thread.is_open() && thread.has_participant(user_id))
            .await
    }

    /// Open, manually renamed threads the user has posted in
    pub async fn query_open_renamed_threads_for_user(&self, user_id: &str) -> Vec<Thread> {
        self.filter(|thread| {
            thread.is_open() && thread.is_manually_renamed && thread.has_participant(user_id)
        })
        .await
    }

    pub async fn count(&self) -> usize {
        self.threads.read().await.len()
    }

    pub async fn clear(&self) {
        self.threads.write().await.clear();
    }

    pub async fn snapshot(&self) -> Vec<Thread> {
        self.threads.read().await.values().cloned().collect()
    }

    async fn filter<F>(&self, predicate: F) -> Vec<Thread>
    where
        F: Fn(&Thread) -> bool,
    {
        self.threads
            .read()
            .await
            .values()
            .filter(|thread| predicate(thread))
            .cloned()
            .collect()
    }
}

impl Default for ThreadRegistry {
    fn default() -> Self {
        Self::new(ThreadRules::default())
    }
}
