use chrono::{DateTime, Utc};
use threadmark_core::naming::{default_name_or_fallback, latest_rename};
use threadmark_core::{ThreadRules, ThreadUpdate};
use threadmark_slack::Message;

/// Rebuild the full state of a thread from its reply list.
///
/// `replies` is ordered oldest to newest with the root message first, as the
/// platform returns it. Returns `None` when there is nothing to rebuild from.
pub fn reconstruct_thread(
    replies: &[Message],
    rules: &ThreadRules,
    created_at: DateTime<Utc>,
) -> Option<ThreadUpdate> {
    let root = replies.first()?;
    let last = replies.last()?;

    let participants = replies.iter().filter_map(|msg| msg.user.clone());

    let update = match latest_rename(replies.iter().map(|msg| msg.text.as_str()), rules) {
        Some(name) => ThreadUpdate::new(name, last.text.clone(), created_at).renamed(true),
        None => ThreadUpdate::new(default_name_or_fallback(&root.text), last.text.clone(), created_at),
    };

    Some(update.participants(participants))
}
