//! Keeps the thread registry in line with the chat platform.
//!
//! [`Backfill`] rebuilds recent history once at startup and
//! [`LiveReconciler`] applies the live message stream afterwards. Both feed
//! the registry through [`reconstruct_thread`] and `ThreadRegistry::upsert`.
//! A reply to a thread the registry does not know triggers a full rebuild of
//! that thread, which is what makes the registry converge even when backfill
//! missed something or is still running.

pub mod backfill;
pub mod live;
pub mod query;
pub mod reconstruct;

pub use backfill::{lookback_floor, Backfill, BackfillConfig, BackfillReport};
pub use live::{EventClass, EventOutcome, IgnoreReason, LiveReconciler, Reply};
pub use query::{format_age, ThreadListing, ThreadQuery, ThreadScope};
pub use reconstruct::reconstruct_thread;
