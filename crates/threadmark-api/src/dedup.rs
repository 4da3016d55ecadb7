use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// How many event ids are remembered before the oldest are forgotten
pub const DEFAULT_SEEN_EVENTS_CAPACITY: usize = 10_000;

/// Bounded memory of Events API `event_id`s already accepted.
///
/// Slack redelivers an event when it did not get a timely 2xx, so a retry
/// may or may not be a duplicate. Only ids recorded here are dropped.
pub struct SeenEvents {
    inner: Mutex<SeenInner>,
    capacity: usize,
}

#[derive(Default)]
struct SeenInner {
    ids: HashSet<String>,
    order: VecDeque<String>,
}

impl SeenEvents {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SEEN_EVENTS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(SeenInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Record `event_id`; returns false if it was already recorded
    pub fn first_delivery(&self, event_id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if inner.ids.contains(event_id) {
            return false;
        }

        if inner.order.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.ids.remove(&oldest);
            }
        }
        inner.ids.insert(event_id.to_string());
        inner.order.push_back(event_id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .order
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SeenEvents {
    fn default() -> Self {
        Self::new()
    }
}
