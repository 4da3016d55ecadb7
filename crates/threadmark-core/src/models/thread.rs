use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::naming::is_close_signal;
use crate::rules::ThreadRules;

/// Identity of a thread: the channel plus the timestamp of its root message
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadKey {
    pub channel: String,
    pub root_ts: String,
}

impl ThreadKey {
    pub fn new(channel: impl Into<String>, root_ts: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            root_ts: root_ts.into(),
        }
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.root_ts)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStatus {
    Open,
    Closed,
}

impl ThreadStatus {
    pub fn from_last_message(text: &str, rules: &ThreadRules) -> Self {
        if is_close_signal(text, rules) {
            ThreadStatus::Closed
        } else {
            ThreadStatus::Open
        }
    }

    pub fn is_open(self) -> bool {
        self == ThreadStatus::Open
    }
}

/// A tracked conversation thread.
///
/// `status` is derived from `last_message_text` and both are only written
/// together through [`Thread::record_last_message`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thread {
    pub key: ThreadKey,
    pub name: String,
    pub is_manually_renamed: bool,
    pub participants: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    last_message_text: String,
    status: ThreadStatus,
}

impl Thread {
    pub(crate) fn from_update(key: ThreadKey, update: ThreadUpdate, rules: &ThreadRules) -> Self {
        let status = ThreadStatus::from_last_message(&update.latest_message_text, rules);
        Self {
            key,
            name: update.candidate_name,
            is_manually_renamed: update.candidate_is_renamed,
            participants: update.participants,
            created_at: update.created_at_if_new,
            last_message_text: update.latest_message_text,
            status,
        }
    }

    pub fn channel(&self) -> &str {
        &self.key.channel
    }

    pub fn root_ts(&self) -> &str {
        &self.key.root_ts
    }

    pub fn last_message_text(&self) -> &str {
        &self.last_message_text
    }

    pub fn status(&self) -> ThreadStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.contains(user_id)
    }

    /// Replace the latest message and re-derive the status from it
    pub fn record_last_message(&mut self, text: impl Into<String>, rules: &ThreadRules) {
        self.last_message_text = text.into();
        self.status = ThreadStatus::from_last_message(&self.last_message_text, rules);
    }

    /// Apply an update to an existing record.
    ///
    /// Participants only grow, the latest message always wins, and the name
    /// only changes when the update carries a rename. The rename flag never
    /// goes back to false.
    pub(crate) fn merge(&mut self, update: ThreadUpdate, rules: &ThreadRules) {
        self.participants.extend(update.participants);
        self.record_last_message(update.latest_message_text, rules);

        if update.candidate_is_renamed {
            self.name = update.candidate_name;
            self.is_manually_renamed = true;
        }
    }
}

/// Everything an upsert needs besides the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadUpdate {
    pub candidate_name: String,
    pub candidate_is_renamed: bool,
    pub participants: BTreeSet<String>,
    pub latest_message_text: String,
    /// Only used when the record does not exist yet
    pub created_at_if_new: DateTime<Utc>,
}

impl ThreadUpdate {
    pub fn new(
        candidate_name: impl Into<String>,
        latest_message_text: impl Into<String>,
        created_at_if_new: DateTime<Utc>,
    ) -> Self {
        Self {
            candidate_name: candidate_name.into(),
            candidate_is_renamed: false,
            participants: BTreeSet::new(),
            latest_message_text: latest_message_text.into(),
            created_at_if_new,
        }
    }

    pub fn renamed(mut self, renamed: bool) -> Self {
        self.candidate_is_renamed = renamed;
        self
    }

    pub fn participant(mut self, user_id: impl Into<String>) -> Self {
        self.participants.insert(user_id.into());
        self
    }

    pub fn participants<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participants.extend(users.into_iter().map(Into::into));
        self
    }
}
