pub mod models;
pub mod naming;
pub mod registry;
pub mod rules;

pub use models::{Thread, ThreadKey, ThreadStatus, ThreadUpdate};
pub use registry::{ThreadLookup, ThreadRegistry};
pub use rules::ThreadRules;
