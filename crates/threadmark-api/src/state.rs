use std::sync::Arc;
use threadmark_core::ThreadRegistry;
use threadmark_slack::ChatPlatform;
use threadmark_sync::{Backfill, LiveReconciler, ThreadQuery};

use crate::config::Config;
use crate::dedup::SeenEvents;

/// Shared application state passed to all handlers
///
/// The registry is created empty here and owned by the state for the life of
/// the process; every component gets a handle to the same instance.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub platform: Arc<dyn ChatPlatform>,
    pub registry: ThreadRegistry,
    pub live: LiveReconciler,
    pub query: Arc<ThreadQuery>,
    /// Event ids already handed to the live reconciler
    pub seen_events: Arc<SeenEvents>,
}

impl AppState {
    pub fn new(config: Config, platform: Arc<dyn ChatPlatform>) -> Self {
        let registry = ThreadRegistry::new(config.threads.clone());
        let live = LiveReconciler::new(
            Arc::clone(&platform),
            registry.clone(),
            config.backfill.replies_limit,
        );
        let query = ThreadQuery::new(Arc::clone(&platform), registry.clone());

        Self {
            config: Arc::new(config),
            platform,
            registry,
            live,
            query: Arc::new(query),
            seen_events: Arc::new(SeenEvents::new()),
        }
    }

    pub fn backfill(&self) -> Backfill {
        Backfill::new(
            Arc::clone(&self.platform),
            self.registry.clone(),
            self.config.backfill_config(),
        )
    }
}
