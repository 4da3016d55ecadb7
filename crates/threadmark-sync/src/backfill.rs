use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use threadmark_core::{ThreadKey, ThreadRegistry};
use threadmark_slack::{slack_ts_to_datetime, Channel, ChatPlatform, Message};

use crate::reconstruct::reconstruct_thread;

/// Start of the lookback window, clamped to the Unix epoch
pub fn lookback_floor(now: DateTime<Utc>, lookback_days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(lookback_days)))
        .map(|floor| floor.max(DateTime::UNIX_EPOCH))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillConfig {
    pub lookback_days: u32,
    pub history_limit: u32,
    pub replies_limit: u32,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            lookback_days: 1,
            history_limit: 1000,
            replies_limit: 1000,
        }
    }
}

impl BackfillConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_replies_limit(mut self, limit: u32) -> Self {
        self.replies_limit = limit;
        self
    }
}

/// What a backfill pass managed to do. Partial completion is normal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub channels_scanned: usize,
    pub channels_failed: usize,
    pub threads_found: usize,
    pub threads_reconstructed: usize,
    pub threads_skipped: usize,
    pub threads_failed: usize,
    /// Registry size once the pass finished
    pub thread_count: usize,
}

/// One-time historical scan that seeds the registry at startup
pub struct Backfill {
    platform: Arc<dyn ChatPlatform>,
    registry: ThreadRegistry,
    config: BackfillConfig,
}

impl Backfill {
    pub fn new(platform: Arc<dyn ChatPlatform>, registry: ThreadRegistry, config: BackfillConfig) -> Self {
        Self {
            platform,
            registry,
            config,
        }
    }

    pub async fn run(&self) -> BackfillReport {
        self.run_at(Utc::now()).await
    }

    /// Run the scan with `now` as the end of the lookback window.
    ///
    /// Failures on one channel or thread are logged and skipped; the pass
    /// itself never fails.
    pub async fn run_at(&self, now: DateTime<Utc>) -> BackfillReport {
        let oldest = lookback_floor(now, self.config.lookback_days);
        let mut report = BackfillReport::default();

        tracing::info!("[Backfill] Starting backfill ({} days)", self.config.lookback_days);

        // 1. Channels the bot can see
        match self.platform.list_channels().await {
            Ok(channels) => {
                tracing::info!("[Backfill] {} channels found", channels.len());

                // 2. Scan each channel independently
                for channel in &channels {
                    self.scan_channel(channel, oldest, &mut report).await;
                }
            }
            Err(e) => {
                tracing::error!("[Backfill] Failed to list channels: {}", e);
            }
        }

        report.thread_count = self.registry.count().await;
        tracing::info!(
            "[Backfill] Backfill complete: {} threads reconstructed, {} failed, {} in registry",
            report.threads_reconstructed,
            report.threads_failed,
            report.thread_count
        );

        report
    }

    async fn scan_channel(&self, channel: &Channel, oldest: DateTime<Utc>, report: &mut BackfillReport) {
        tracing::info!("[Backfill] Scanning channel: {} ({})", channel.name, channel.id);

        let history = match self
            .platform
            .fetch_history(&channel.id, oldest, self.config.history_limit)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!("[Backfill] Error fetching history for {}: {}", channel.id, e);
                report.channels_failed += 1;
                return;
            }
        };
        report.channels_scanned += 1;

        // 3. A root without replies is not a thread
        let roots: Vec<&Message> = history
            .iter()
            .filter(|msg| msg.has_replies() && !msg.ts.is_empty())
            .collect();
        tracing::info!("[Backfill]   -> {} threads found", roots.len());
        report.threads_found += roots.len();

        // 4. Rebuild every thread from its replies
        for root in roots {
            self.backfill_thread(&channel.id, root, report).await;
        }
    }

    async fn backfill_thread(&self, channel_id: &str, root: &Message, report: &mut BackfillReport) {
        let key = ThreadKey::new(channel_id, root.ts.clone());

        let replies = match self
            .platform
            .fetch_replies(channel_id, &root.ts, self.config.replies_limit)
            .await
        {
            Ok(replies) => replies,
            Err(e) => {
                tracing::error!("[Backfill] Error fetching replies for {}: {}", key, e);
                report.threads_failed += 1;
                return;
            }
        };

        // The thread was created when its root was posted
        let created_at = replies
            .first()
            .and_then(|msg| slack_ts_to_datetime(&msg.ts))
            .or_else(|| slack_ts_to_datetime(&root.ts))
            .unwrap_or_else(Utc::now);

        match reconstruct_thread(&replies, self.registry.rules(), created_at) {
            Some(update) => {
                let thread = self.registry.upsert(key, update).await;
                tracing::debug!("[Backfill] Thread reconstructed: {} ({})", thread.key, thread.name);
                report.threads_reconstructed += 1;
            }
            None => {
                tracing::debug!("[Backfill] No messages returned for {}, skipping", key);
                report.threads_skipped += 1;
            }
        }
    }
}
