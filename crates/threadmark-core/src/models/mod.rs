mod thread;

pub use thread::{Thread, ThreadKey, ThreadStatus, ThreadUpdate};
